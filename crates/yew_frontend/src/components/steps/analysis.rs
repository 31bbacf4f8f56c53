//! Step 2: run the server-side analysis and poll for its result

use wasm_bindgen_futures::spawn_local;
use wizard_core::poll::{PROGRESS_ACCEPTED, PROGRESS_DONE, PROGRESS_STARTING};
use wizard_core::{
    normalize, AnalysisResults, PollPolicy, PollTracker, StageStatus, WizardAction, WizardUpdate,
};
use yew::prelude::*;

use crate::app::{use_api, WizardProps};
use crate::hooks::use_liveness;
use crate::services::poll_analysis;

/// What the analysis screen shows while a job is in flight
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisView {
    pub running: bool,
    pub progress: u8,
    pub status: String,
    pub error: Option<String>,
}

impl AnalysisView {
    fn starting() -> Self {
        Self::running(PROGRESS_STARTING, "Starting analysis...")
    }

    fn accepted() -> Self {
        Self::running(PROGRESS_ACCEPTED, "Analysis started, waiting for results...")
    }

    fn polling(tracker: &PollTracker) -> Self {
        Self::running(tracker.progress(), tracker.status_message())
    }

    fn completed() -> Self {
        Self {
            running: false,
            progress: PROGRESS_DONE,
            status: "Analysis completed".to_string(),
            error: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }

    fn running(progress: u8, status: impl Into<String>) -> Self {
        Self {
            running: true,
            progress,
            status: status.into(),
            error: None,
        }
    }
}

fn stage_list(results: &AnalysisResults) -> Html {
    html! {
        <ul class="stage-list" data-testid="analysis-stages">
            { for results.stage_statuses().into_iter().map(|(stage, status)| {
                let label = match status {
                    StageStatus::Success => "success",
                    StageStatus::Skipped => "skipped",
                };
                html! {
                    <li class={classes!("stage", label)}>
                        <span class="stage-name">{ stage.name() }</span>
                        <span class="stage-status">{ label }</span>
                    </li>
                }
            })}
        </ul>
    }
}

#[function_component(AnalysisStep)]
pub fn analysis_step(props: &WizardProps) -> Html {
    let api = use_api();
    let liveness = use_liveness();
    let view = use_state(AnalysisView::default);

    let source = props.wizard.0.data().source.clone();
    let upload = source.as_ref().and_then(|s| s.file_id.clone().zip(s.storage_path.clone()));

    let on_start = {
        let view = view.clone();
        let wizard = props.wizard.clone();
        let liveness = liveness.clone();
        let upload = upload.clone();
        Callback::from(move |_: MouseEvent| {
            let Some((file_id, storage_path)) = upload.clone() else {
                view.set(AnalysisView::failed("Upload a file first".to_string()));
                return;
            };

            // A new run supersedes whatever was still polling
            liveness.invalidate();
            let token = liveness.token();
            view.set(AnalysisView::starting());

            let api = api.clone();
            let view = view.clone();
            let wizard = wizard.clone();
            spawn_local(async move {
                let started = api.start_analysis(&file_id, &storage_path).await;
                if !token.is_live() {
                    return;
                }
                let analysis_id = match started {
                    Ok(response) => response.analysis_id,
                    Err(error) => {
                        view.set(AnalysisView::failed(error.message));
                        return;
                    }
                };
                view.set(AnalysisView::accepted());

                let progress = view.clone();
                let polled = poll_analysis(&api, &analysis_id, PollPolicy::default(), &token, |t| {
                    progress.set(AnalysisView::polling(t))
                })
                .await;

                match polled {
                    Ok(Some(raw)) => {
                        wizard.dispatch(WizardAction::UpdateData(WizardUpdate::analysis(
                            normalize(raw),
                        )));
                        view.set(AnalysisView::completed());
                    }
                    Ok(None) => {}
                    Err(error) => {
                        gloo::console::warn!(format!("analysis {} failed: {}", analysis_id, error));
                        if token.is_live() {
                            view.set(AnalysisView::failed(error.message));
                        }
                    }
                }
            });
        })
    };

    let on_reset = {
        let view = view.clone();
        Callback::from(move |_: MouseEvent| {
            liveness.invalidate();
            view.set(AnalysisView::default());
        })
    };

    let results = props.wizard.0.data().analysis.clone();

    html! {
        <div class="analysis-step">
            if upload.is_none() {
                <p class="hint">{ "Upload a file on the previous step to analyze it." }</p>
            }
            <button
                onclick={on_start}
                disabled={view.running || upload.is_none()}
                data-testid="start-analysis"
            >
                { if results.is_some() { "Re-run analysis" } else { "Start analysis" } }
            </button>
            <button onclick={on_reset} data-testid="reset-analysis">{ "Reset" }</button>
            if view.running || view.progress > 0 {
                <div class="analysis-progress" data-testid="analysis-progress">
                    <progress max="100" value={view.progress.to_string()} />
                    <span>{ format!("{}% {}", view.progress, view.status) }</span>
                </div>
            }
            if let Some(error) = &view.error {
                <div class="error-message" data-testid="step-error">{ error }</div>
            }
            if let Some(results) = &results {
                <div class="analysis-results">
                    <p>{ &results.message }</p>
                    <p>
                        <strong>{ "Recommended storage: " }</strong>
                        { results.recommended_storage() }
                    </p>
                    <p class="reasoning">{ &results.stages.storage_selection.result.reasoning }</p>
                    { stage_list(results) }
                </div>
            }
        </div>
    }
}
