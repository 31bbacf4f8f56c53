//! Loading/error bookkeeping shared by the operation controllers

use tracing::warn;
use wizard_core::AppError;

use crate::error::ApiError;

/// `loading` and `error` of one controller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationState {
    loading: bool,
    error: Option<String>,
}

impl OperationState {
    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Enter an attempt: loading on, previous error gone. The returned guard
    /// clears `loading` when dropped, so an abandoned attempt never leaves
    /// the controller stuck.
    pub(crate) fn begin(&mut self) -> Attempt<'_> {
        self.loading = true;
        self.error = None;
        Attempt { state: self }
    }

    /// Record a failure that happened before any request was sent
    pub(crate) fn reject(&mut self, error: AppError) {
        warn!(error = %error, "operation rejected locally");
        self.loading = false;
        self.error = Some(error.message);
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One in-flight action of a controller
pub(crate) struct Attempt<'a> {
    state: &'a mut OperationState,
}

impl Attempt<'_> {
    /// Close the attempt. Failures are classified and stored, and come back
    /// as `None`.
    pub(crate) fn settle<T>(self, outcome: Result<T, ApiError>) -> Option<T> {
        match outcome {
            Ok(value) => Some(value),
            Err(error) => {
                self.state.error = Some(AppError::from(error).message);
                None
            }
        }
    }

    pub(crate) fn reject(self, error: AppError) {
        self.state.reject(error);
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        self.state.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_success_clears_loading() {
        let mut state = OperationState::default();
        let attempt = state.begin();
        assert!(attempt.state.loading());

        assert_eq!(attempt.settle(Ok::<_, ApiError>(7)), Some(7));
        assert!(!state.loading());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_settle_failure_stores_message() {
        let mut state = OperationState::default();

        let outcome: Option<()> = state.begin().settle(Err(ApiError::Http {
            status: 500,
            body: String::new(),
        }));
        assert!(outcome.is_none());
        assert!(!state.loading());
        assert_eq!(state.error(), Some("Server error: 500"));
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let mut state = OperationState::default();
        state.reject(AppError::validation("No file selected"));
        assert_eq!(state.error(), Some("No file selected"));

        drop(state.begin());
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_dropped_attempt_clears_loading() {
        let mut state = OperationState::default();
        {
            let attempt = state.begin();
            assert!(attempt.state.loading());
        }
        assert!(!state.loading());
        assert_eq!(state.error(), None);
    }
}
