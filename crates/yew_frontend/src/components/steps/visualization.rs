//! Step 5: generate the pipeline and show its DAG

use wasm_bindgen_futures::spawn_local;
use wizard_core::validators::validate_pipeline_data;
use wizard_core::{PipelineDraft, WizardAction, WizardData, WizardUpdate};
use yew::prelude::*;

use super::status_line;
use crate::app::{use_api, WizardProps};
use crate::components::OperationStatus;
use crate::hooks::use_liveness;

/// DAG to display: the generated pipeline's, else the analysis ETL stage's
pub fn dag_preview(data: &WizardData) -> Option<String> {
    data.pipeline
        .as_ref()
        .and_then(|p| p.dag_code.clone())
        .or_else(|| {
            data.analysis
                .as_ref()
                .map(|a| a.stages.etl_build.result.python_code.clone())
        })
        .filter(|code| !code.trim().is_empty())
}

#[function_component(VisualizationStep)]
pub fn visualization_step(props: &WizardProps) -> Html {
    let api = use_api();
    let liveness = use_liveness();
    let status = use_state(OperationStatus::default);

    let on_generate = {
        let status = status.clone();
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| {
            let draft = PipelineDraft::from_wizard(wizard.0.data());
            let validation = validate_pipeline_data(&draft);
            if !validation.is_valid {
                status.set(OperationStatus::failed(validation.message()));
                return;
            }

            status.set(OperationStatus::started());
            let api = api.clone();
            let status = status.clone();
            let wizard = wizard.clone();
            let token = liveness.token();
            spawn_local(async move {
                let result = api.generate_pipeline(&draft).await;
                if !token.is_live() {
                    return;
                }
                match result {
                    Ok(pipeline) => {
                        gloo::console::log!(format!("generated pipeline {}", pipeline.id));
                        wizard.dispatch(WizardAction::UpdateData(WizardUpdate::pipeline(pipeline)));
                        status.set(OperationStatus::done());
                    }
                    Err(error) => status.set(OperationStatus::failed(error.message)),
                }
            });
        })
    };

    let data = props.wizard.0.data();
    let dag = dag_preview(data);

    html! {
        <div class="visualization-step">
            <button
                onclick={on_generate}
                disabled={status.loading}
                data-testid="generate-pipeline"
            >
                { if status.loading { "Generating..." } else { "Generate pipeline" } }
            </button>
            { status_line(&status) }
            if let Some(pipeline) = &data.pipeline {
                <dl class="pipeline-summary" data-testid="pipeline-summary">
                    <dt>{ "Pipeline" }</dt>
                    <dd>{ pipeline.name.clone().unwrap_or_else(|| pipeline.id.clone()) }</dd>
                    <dt>{ "Status" }</dt>
                    <dd>{ format!("{:?}", pipeline.status) }</dd>
                    <dt>{ "Target" }</dt>
                    <dd>{ pipeline.target.system.to_string() }</dd>
                    <dt>{ "Transformations" }</dt>
                    <dd>{ pipeline.transformations.len() }</dd>
                </dl>
            }
            if let Some(code) = dag {
                <pre class="dag-code" data-testid="dag-code"><code>{ code }</code></pre>
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dag_preview_empty_without_data() {
        assert_eq!(dag_preview(&WizardData::default()), None);
    }
}
