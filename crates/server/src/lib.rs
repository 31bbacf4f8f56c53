//! In-memory mock of the ETL pipeline backend
//!
//! Implements the same HTTP contract the wizard talks to: uploads, analysis
//! jobs that answer `202 Accepted` a configurable number of times before
//! completing, and pipeline generate/get/execute/delete/list.

mod fixtures;
mod routes;
mod store;

pub use routes::{router, API_PREFIX};
pub use store::{AppState, MockConfig};
