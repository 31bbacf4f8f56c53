//! UI components

pub mod navigation;
pub mod progress;
pub mod steps;

/// Loading flag and error line for one async action of a step screen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperationStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl OperationStatus {
    pub fn started() -> Self {
        Self {
            loading: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            loading: false,
            error: Some(message.into()),
        }
    }

    pub fn done() -> Self {
        Self::default()
    }
}
