//! Target storage systems and their default connection settings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage system a pipeline loads into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetSystem {
    PostgreSql,
    ClickHouse,
    Hdfs,
}

impl TargetSystem {
    pub const ALL: [TargetSystem; 3] = [
        TargetSystem::PostgreSql,
        TargetSystem::ClickHouse,
        TargetSystem::Hdfs,
    ];

    /// Identifier used on the wire and on the command line
    pub fn id(self) -> &'static str {
        match self {
            TargetSystem::PostgreSql => "postgresql",
            TargetSystem::ClickHouse => "clickhouse",
            TargetSystem::Hdfs => "hdfs",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|system| system.id().eq_ignore_ascii_case(id.trim()))
    }

    pub fn info(self) -> TargetInfo {
        match self {
            TargetSystem::PostgreSql => TargetInfo {
                name: "PostgreSQL",
                description: "Relational database for OLTP workloads",
                features: &["ACID", "JSON support", "Full-text search"],
            },
            TargetSystem::ClickHouse => TargetInfo {
                name: "ClickHouse",
                description: "Analytical DBMS for OLAP workloads",
                features: &["High throughput", "Data compression", "Columnar storage"],
            },
            TargetSystem::Hdfs => TargetInfo {
                name: "HDFS",
                description: "Distributed file system",
                features: &["Scalability", "Fault tolerance", "Big data"],
            },
        }
    }

    pub fn default_config(self) -> TargetConfig {
        match self {
            TargetSystem::PostgreSql => TargetConfig::PostgreSql(PostgresConfig::default()),
            TargetSystem::ClickHouse => TargetConfig::ClickHouse(ClickHouseConfig::default()),
            TargetSystem::Hdfs => TargetConfig::Hdfs(HdfsConfig::default()),
        }
    }
}

impl fmt::Display for TargetSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().name)
    }
}

/// Display data for the target selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
}

/// Connection settings, one variant per [`TargetSystem`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetConfig {
    PostgreSql(PostgresConfig),
    ClickHouse(ClickHouseConfig),
    Hdfs(HdfsConfig),
}

impl TargetConfig {
    pub fn system(&self) -> TargetSystem {
        match self {
            TargetConfig::PostgreSql(_) => TargetSystem::PostgreSql,
            TargetConfig::ClickHouse(_) => TargetSystem::ClickHouse,
            TargetConfig::Hdfs(_) => TargetSystem::Hdfs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub ssl: bool,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "analytics".to_string(),
            username: "user".to_string(),
            password: String::new(),
            ssl: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub cluster: String,
}

impl Default for ClickHouseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 9000,
            database: "analytics".to_string(),
            username: "default".to_string(),
            password: String::new(),
            cluster: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdfsConfig {
    pub namenode: String,
    pub path: String,
    pub replication: u8,
    /// Block size in bytes
    pub block_size: u64,
}

impl Default for HdfsConfig {
    fn default() -> Self {
        Self {
            namenode: "localhost:9000".to_string(),
            path: "/data/analytics".to_string(),
            replication: 3,
            block_size: 128 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_system() {
        for system in TargetSystem::ALL {
            assert_eq!(system.default_config().system(), system);
        }
    }

    #[test]
    fn test_from_id_is_case_insensitive() {
        assert_eq!(TargetSystem::from_id("PostgreSQL"), Some(TargetSystem::PostgreSql));
        assert_eq!(TargetSystem::from_id(" hdfs "), Some(TargetSystem::Hdfs));
        assert_eq!(TargetSystem::from_id("oracle"), None);
    }

    #[test]
    fn test_hdfs_defaults() {
        let TargetConfig::Hdfs(config) = TargetSystem::Hdfs.default_config() else {
            panic!("expected hdfs config");
        };
        assert_eq!(config.replication, 3);
        assert_eq!(config.block_size, 134_217_728);
    }

    #[test]
    fn test_target_config_is_tagged() {
        let json = serde_json::to_value(TargetSystem::ClickHouse.default_config()).unwrap();
        assert_eq!(json["kind"], "clickhouse");
        assert_eq!(json["port"], 9000);
    }
}
