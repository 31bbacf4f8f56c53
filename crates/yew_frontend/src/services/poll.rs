//! Analysis polling on browser timers

use gloo::timers::future::sleep;
use wizard_core::wire::AnalysisPoll;
use wizard_core::{AppError, PollDecision, PollPolicy, PollTracker, RawAnalysisResult};

use super::api::BrowserApi;
use crate::hooks::LiveToken;

/// Poll until the job finishes. `Ok(None)` means the token died first and
/// nothing should be written anywhere.
pub async fn poll_analysis<F>(
    api: &BrowserApi,
    analysis_id: &str,
    policy: PollPolicy,
    token: &LiveToken,
    mut on_progress: F,
) -> Result<Option<RawAnalysisResult>, AppError>
where
    F: FnMut(&PollTracker),
{
    let mut tracker = PollTracker::new(policy);
    let mut delay = tracker.first_delay();

    loop {
        sleep(delay).await;
        if !token.is_live() {
            return Ok(None);
        }
        on_progress(&tracker);

        let poll = api.analysis_status(analysis_id).await?;
        if !token.is_live() {
            return Ok(None);
        }
        match poll {
            AnalysisPoll::Completed(raw) => return Ok(Some(raw)),
            AnalysisPoll::Failed(message) => return Err(AppError::unknown(message)),
            AnalysisPoll::Processing => match tracker.record_processing() {
                PollDecision::Retry { after } => delay = after,
                PollDecision::TimedOut => return Err(AppError::timeout(policy.timeout())),
            },
        }
    }
}
