//! Analysis controller and the native polling driver
//!
//! A started job is polled by a background tokio task. The task shares state
//! with the controller through a `watch` channel; every write is tagged with
//! the generation it was started under, so a reset (or a newer start) turns
//! any late continuation into a no-op.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wizard_core::poll::{PROGRESS_ACCEPTED, PROGRESS_DONE, PROGRESS_STARTING};
use wizard_core::wire::AnalysisPoll;
use wizard_core::{
    normalize, AnalysisResults, AppError, PollDecision, PollPolicy, PollTracker,
    RawAnalysisResult,
};

use crate::client::PipelineApi;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisPhase {
    #[default]
    Idle,
    Starting,
    Polling,
    Completed,
    Failed,
}

/// Observable state of the analysis controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisState {
    pub phase: AnalysisPhase,
    pub loading: bool,
    pub error: Option<String>,
    pub analysis_id: Option<String>,
    /// 0..=100
    pub progress: u8,
    pub status_message: Option<String>,
    pub result: Option<AnalysisResults>,
    /// Status queries issued for the current job
    pub polls: u32,
}

impl AnalysisState {
    pub fn is_analyzing(&self) -> bool {
        matches!(self.phase, AnalysisPhase::Starting | AnalysisPhase::Polling)
    }
}

/// How a poll loop ended without an error
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(RawAnalysisResult),
    /// The tick callback asked to stop
    Cancelled,
}

/// Query the job status until it completes, fails or runs out of time.
///
/// `on_tick` runs before every status query; returning `false` stops the
/// loop without issuing that query. Queries never overlap.
pub async fn poll_until_complete<F>(
    api: &dyn PipelineApi,
    analysis_id: &str,
    policy: PollPolicy,
    mut on_tick: F,
) -> Result<PollOutcome, AppError>
where
    F: FnMut(&PollTracker) -> bool,
{
    let mut tracker = PollTracker::new(policy);
    let mut delay = tracker.first_delay();

    loop {
        tokio::time::sleep(delay).await;
        if !on_tick(&tracker) {
            return Ok(PollOutcome::Cancelled);
        }

        match api.analysis_status(analysis_id).await? {
            AnalysisPoll::Completed(raw) => return Ok(PollOutcome::Completed(raw)),
            AnalysisPoll::Failed(message) => return Err(AppError::unknown(message)),
            AnalysisPoll::Processing => match tracker.record_processing() {
                PollDecision::Retry { after } => {
                    debug!(analysis_id, elapsed = ?tracker.elapsed(), "analysis still processing");
                    delay = after;
                }
                PollDecision::TimedOut => return Err(AppError::timeout(policy.timeout())),
            },
        }
    }
}

/// Returns the controller to idle if a start request is abandoned mid-flight
struct StartGuard {
    shared: Arc<Shared>,
    generation: u64,
}

impl Drop for StartGuard {
    fn drop(&mut self) {
        let shared = &self.shared;
        let abandoned = shared.state.send_if_modified(|state| {
            let current = shared.generation.load(Ordering::SeqCst) == self.generation;
            if !current || state.phase != AnalysisPhase::Starting {
                return false;
            }
            *state = AnalysisState::default();
            true
        });
        if abandoned {
            debug!("analysis start abandoned");
        }
    }
}

struct Shared {
    state: watch::Sender<AnalysisState>,
    generation: AtomicU64,
}

impl Shared {
    /// Apply `change` only while `generation` is still current
    fn update(&self, generation: u64, change: impl FnOnce(&mut AnalysisState)) -> bool {
        self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            change(state);
            true
        })
    }

    /// Invalidate every continuation started so far
    fn bump(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Starts analysis jobs and tracks them to completion
pub struct AnalysisController {
    api: Arc<dyn PipelineApi>,
    policy: PollPolicy,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl AnalysisController {
    pub fn new(api: Arc<dyn PipelineApi>) -> Self {
        Self::with_policy(api, PollPolicy::default())
    }

    pub fn with_policy(api: Arc<dyn PipelineApi>, policy: PollPolicy) -> Self {
        let (state, _) = watch::channel(AnalysisState::default());
        Self {
            api,
            policy,
            shared: Arc::new(Shared {
                state,
                generation: AtomicU64::new(0),
            }),
            task: None,
        }
    }

    /// Start a job and begin polling it in the background. Returns the job id,
    /// or `None` when the start request failed (see [`AnalysisState::error`]).
    pub async fn start_analysis(&mut self, file_id: &str, file_path: &str) -> Option<String> {
        let generation = self.cancel();
        self.shared.state.send_replace(AnalysisState {
            phase: AnalysisPhase::Starting,
            loading: true,
            progress: PROGRESS_STARTING,
            status_message: Some("Starting analysis...".to_string()),
            ..AnalysisState::default()
        });
        let _abandon = StartGuard {
            shared: Arc::clone(&self.shared),
            generation,
        };

        let response = match self.api.start_analysis(file_id, file_path).await {
            Ok(response) => response,
            Err(error) => {
                let error = AppError::from(error);
                self.shared.update(generation, |state| {
                    state.phase = AnalysisPhase::Failed;
                    state.loading = false;
                    state.error = Some(error.message);
                });
                return None;
            }
        };

        let analysis_id = response.analysis_id;
        info!(%analysis_id, file_id, "analysis started");
        let accepted = self.shared.update(generation, |state| {
            state.phase = AnalysisPhase::Polling;
            state.analysis_id = Some(analysis_id.clone());
            state.progress = PROGRESS_ACCEPTED;
            state.status_message = Some("Analysis started, waiting for results...".to_string());
        });
        if !accepted {
            return None;
        }

        let api = Arc::clone(&self.api);
        let shared = Arc::clone(&self.shared);
        let policy = self.policy;
        let id = analysis_id.clone();
        self.task = Some(tokio::spawn(async move {
            run_poll(api, shared, generation, id, policy).await;
        }));

        Some(analysis_id)
    }

    pub fn snapshot(&self) -> AnalysisState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.shared.state.subscribe()
    }

    /// Wait until the current job (if any) reaches a terminal phase
    pub async fn wait(&self) -> AnalysisState {
        let mut receiver = self.subscribe();
        let state = match receiver.wait_for(|state| !state.is_analyzing()).await {
            Ok(state) => state.clone(),
            Err(_) => self.snapshot(),
        };
        state
    }

    /// Stop polling and return to the idle state. Safe to call at any time,
    /// any number of times.
    pub fn reset_analysis(&mut self) {
        self.cancel();
        self.shared.state.send_replace(AnalysisState::default());
        debug!("analysis reset");
    }

    fn cancel(&mut self) -> u64 {
        let generation = self.shared.bump();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        generation
    }
}

impl Drop for AnalysisController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_poll(
    api: Arc<dyn PipelineApi>,
    shared: Arc<Shared>,
    generation: u64,
    analysis_id: String,
    policy: PollPolicy,
) {
    let outcome = poll_until_complete(api.as_ref(), &analysis_id, policy, |tracker| {
        shared.update(generation, |state| {
            state.polls = tracker.processing_answers() + 1;
            state.progress = tracker.progress();
            state.status_message = Some(tracker.status_message());
        })
    })
    .await;

    match outcome {
        Ok(PollOutcome::Completed(raw)) => {
            let results = normalize(raw);
            info!(%analysis_id, storage = results.recommended_storage(), "analysis completed");
            shared.update(generation, |state| {
                state.phase = AnalysisPhase::Completed;
                state.loading = false;
                state.progress = PROGRESS_DONE;
                state.status_message = Some("Analysis completed".to_string());
                state.result = Some(results);
            });
        }
        Ok(PollOutcome::Cancelled) => debug!(%analysis_id, "polling cancelled"),
        Err(error) => {
            warn!(%analysis_id, error = %error, "analysis failed");
            shared.update(generation, |state| {
                state.phase = AnalysisPhase::Failed;
                state.loading = false;
                state.error = Some(error.message);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::testing::{sample_raw_result, FakeApi};
    use std::time::Duration;
    use tokio::time::Instant;

    const FILE_PATH: &str = "/files/file-1/orders.csv";

    #[tokio::test(start_paused = true)]
    async fn test_three_processing_then_completed() {
        let fake = Arc::new(FakeApi::with_script(vec![
            Ok(AnalysisPoll::Processing),
            Ok(AnalysisPoll::Processing),
            Ok(AnalysisPoll::Processing),
            Ok(AnalysisPoll::Completed(sample_raw_result())),
        ]));
        let mut controller = AnalysisController::new(fake.clone());
        let started = Instant::now();

        let id = controller.start_analysis("file-1", FILE_PATH).await;
        assert_eq!(id.as_deref(), Some("analysis-1"));

        let state = controller.wait().await;
        assert_eq!(started.elapsed(), Duration::from_secs(20));
        assert_eq!(state.phase, AnalysisPhase::Completed);
        assert_eq!(state.progress, 100);
        assert_eq!(state.polls, 4);
        assert!(!state.loading);
        assert_eq!(state.result.unwrap().recommended_storage(), "PostgreSQL");
        assert_eq!(fake.status_calls(), 4);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.status_calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_completing_job_times_out() {
        let fake = Arc::new(FakeApi::default());
        let mut controller = AnalysisController::new(fake.clone());
        let started = Instant::now();

        controller.start_analysis("file-1", FILE_PATH).await.unwrap();
        let state = controller.wait().await;

        assert_eq!(started.elapsed(), Duration::from_secs(120));
        assert_eq!(state.phase, AnalysisPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("Analysis timed out after 120s"));
        assert_eq!(fake.status_calls(), 24);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fake.status_calls(), 24);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_mid_poll_stops_everything() {
        let fake = Arc::new(FakeApi::default());
        let mut controller = AnalysisController::new(fake.clone());

        controller.start_analysis("file-1", FILE_PATH).await.unwrap();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(fake.status_calls(), 2);
        assert!(controller.snapshot().is_analyzing());

        controller.reset_analysis();
        controller.reset_analysis();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(fake.status_calls(), 2);
        assert_eq!(controller.snapshot(), AnalysisState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_start_clears_loading() {
        let mut controller = AnalysisController::new(Arc::new(FakeApi::stalled()));

        let attempt = tokio::time::timeout(
            Duration::from_secs(1),
            controller.start_analysis("file-1", FILE_PATH),
        )
        .await;
        assert!(attempt.is_err());

        let state = controller.snapshot();
        assert!(!state.loading);
        assert_eq!(state.phase, AnalysisPhase::Idle);

        let waited = tokio::time::timeout(Duration::from_secs(600), controller.wait()).await;
        assert_eq!(waited.ok(), Some(AnalysisState::default()));
    }

    #[tokio::test]
    async fn test_stale_generation_cannot_write() {
        let mut controller = AnalysisController::new(Arc::new(FakeApi::default()));
        let stale = controller.shared.generation.load(Ordering::SeqCst);

        controller.reset_analysis();
        assert!(!controller.shared.update(stale, |state| state.progress = 99));
        assert_eq!(controller.snapshot().progress, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_ends_polling() {
        let fake = Arc::new(FakeApi::with_script(vec![
            Ok(AnalysisPoll::Processing),
            Err(ApiError::Http {
                status: 500,
                body: "boom".to_string(),
            }),
        ]));
        let mut controller = AnalysisController::new(fake.clone());

        controller.start_analysis("file-1", FILE_PATH).await.unwrap();
        let state = controller.wait().await;

        assert_eq!(state.phase, AnalysisPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("Server error: 500"));
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(fake.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_job_reports_server_message() {
        let fake = Arc::new(FakeApi::with_script(vec![Ok(AnalysisPoll::Failed(
            "parser crashed".to_string(),
        ))]));
        let mut controller = AnalysisController::new(fake.clone());

        controller.start_analysis("file-1", FILE_PATH).await.unwrap();
        let state = controller.wait().await;

        assert_eq!(state.error.as_deref(), Some("parser crashed"));
        assert_eq!(fake.status_calls(), 1);
    }

    #[tokio::test]
    async fn test_start_failure_never_polls() {
        let fake = Arc::new(FakeApi::failing(ApiError::Network("refused".to_string())));
        let mut controller = AnalysisController::new(fake.clone());

        assert!(controller.start_analysis("file-1", FILE_PATH).await.is_none());
        let state = controller.snapshot();
        assert_eq!(state.phase, AnalysisPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("Could not connect to the server"));
        assert!(!state.loading);
        assert_eq!(fake.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_callback_can_cancel() {
        let fake = FakeApi::default();
        let outcome = poll_until_complete(&fake, "analysis-1", PollPolicy::default(), |tracker| {
            tracker.processing_answers() < 2
        })
        .await;

        assert_eq!(outcome, Ok(PollOutcome::Cancelled));
        assert_eq!(fake.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_advances_while_polling() {
        let mut controller = AnalysisController::new(Arc::new(FakeApi::default()));

        controller.start_analysis("file-1", FILE_PATH).await.unwrap();
        assert_eq!(controller.snapshot().progress, 30);

        tokio::time::sleep(Duration::from_secs(61)).await;
        let state = controller.snapshot();
        assert!(state.progress > 40 && state.progress < 90);
        assert_eq!(state.status_message.as_deref(), Some("Analysis running... (55s)"));
    }
}
