//! Step 6: run or delete the generated pipeline and watch its log

use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use wizard_core::validators::is_valid_email;
use wizard_core::{
    ExecutionStatus, JobStatus, LogLevel, MonitoringState, WizardAction, WizardUpdate,
};
use yew::prelude::*;

use super::status_line;
use crate::app::{use_api, WizardHandle, WizardProps};
use crate::components::OperationStatus;
use crate::hooks::use_liveness;

/// Execution state after the server answered an execute call
pub fn execution_outcome(status: JobStatus) -> (ExecutionStatus, LogLevel) {
    match status {
        JobStatus::Completed => (ExecutionStatus::Completed, LogLevel::Success),
        JobStatus::Failed => (ExecutionStatus::Failed, LogLevel::Error),
        JobStatus::Pending | JobStatus::Running => (ExecutionStatus::Running, LogLevel::Info),
    }
}

fn publish(wizard: &WizardHandle, monitoring: &MonitoringState) {
    wizard.dispatch(WizardAction::UpdateData(WizardUpdate::monitoring(
        monitoring.clone(),
    )));
}

fn log_list(monitoring: &MonitoringState) -> Html {
    html! {
        <ul class="execution-log" data-testid="execution-log">
            { for monitoring.logs.iter().map(|entry| {
                let level = match entry.level {
                    LogLevel::Info => "info",
                    LogLevel::Success => "success",
                    LogLevel::Error => "error",
                };
                html! {
                    <li class={classes!("log-entry", level)}>
                        <time>{ entry.timestamp.format("%H:%M:%S").to_string() }</time>
                        { " " }{ &entry.message }
                    </li>
                }
            })}
        </ul>
    }
}

#[function_component(MonitoringStep)]
pub fn monitoring_step(props: &WizardProps) -> Html {
    let api = use_api();
    let liveness = use_liveness();
    let status = use_state(OperationStatus::default);

    let email = use_state(String::new);
    let email_error = use_state(|| None::<String>);

    let pipeline_id = props.wizard.0.data().pipeline.as_ref().map(|p| p.id.clone());

    let on_email = {
        let email = email.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            email.set(input.value());
        })
    };

    let on_notify = {
        let email = email.clone();
        let email_error = email_error.clone();
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| {
            let address = email.trim().to_string();
            if !is_valid_email(&address) {
                email_error.set(Some("Enter a valid e-mail address".to_string()));
                return;
            }
            email_error.set(None);
            let mut monitoring = wizard.0.data().monitoring.clone().unwrap_or_default();
            let current = monitoring.execution_status;
            monitoring.record(
                current,
                LogLevel::Info,
                format!("Notifications will be sent to {}", address),
            );
            publish(&wizard, &monitoring);
        })
    };

    let on_execute = {
        let api = api.clone();
        let liveness = liveness.clone();
        let status = status.clone();
        let wizard = props.wizard.clone();
        let pipeline_id = pipeline_id.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(id) = pipeline_id.clone() else {
                return;
            };
            let mut monitoring = wizard.0.data().monitoring.clone().unwrap_or_default();
            monitoring.record(ExecutionStatus::Running, LogLevel::Info, "Starting pipeline...");
            publish(&wizard, &monitoring);
            status.set(OperationStatus::started());

            let api = api.clone();
            let status = status.clone();
            let wizard = wizard.clone();
            let token = liveness.token();
            spawn_local(async move {
                let result = api.execute_pipeline(&id).await;
                if !token.is_live() {
                    return;
                }
                match result {
                    Ok(response) => {
                        let (execution, level) = execution_outcome(response.status);
                        let message = response
                            .message
                            .unwrap_or_else(|| "Pipeline executed".to_string());
                        monitoring.record(execution, level, message);
                        publish(&wizard, &monitoring);
                        status.set(OperationStatus::done());
                    }
                    Err(error) => {
                        monitoring.record(
                            ExecutionStatus::Failed,
                            LogLevel::Error,
                            error.message.clone(),
                        );
                        publish(&wizard, &monitoring);
                        status.set(OperationStatus::failed(error.message));
                    }
                }
            });
        })
    };

    let on_delete = {
        let status = status.clone();
        let wizard = props.wizard.clone();
        let pipeline_id = pipeline_id.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(id) = pipeline_id.clone() else {
                return;
            };
            status.set(OperationStatus::started());

            let mut monitoring = wizard.0.data().monitoring.clone().unwrap_or_default();
            let api = api.clone();
            let status = status.clone();
            let wizard = wizard.clone();
            let token = liveness.token();
            spawn_local(async move {
                let result = api.delete_pipeline(&id).await;
                if !token.is_live() {
                    return;
                }
                match result {
                    Ok(_) => {
                        monitoring.record(
                            ExecutionStatus::Deleted,
                            LogLevel::Info,
                            format!("Pipeline {} deleted", id),
                        );
                        publish(&wizard, &monitoring);
                        status.set(OperationStatus::done());
                    }
                    Err(error) => status.set(OperationStatus::failed(error.message)),
                }
            });
        })
    };

    let monitoring = props.wizard.0.data().monitoring.clone().unwrap_or_default();
    let deleted = monitoring.execution_status == ExecutionStatus::Deleted;
    let busy = status.loading || pipeline_id.is_none() || deleted;

    html! {
        <div class="monitoring-step">
            if pipeline_id.is_none() {
                <p class="hint">{ "Generate a pipeline first." }</p>
            }
            <p class="execution-status" data-testid="execution-status">
                { format!("Status: {:?}", monitoring.execution_status) }
            </p>
            <button onclick={on_execute} disabled={busy} data-testid="execute-pipeline">
                { "Run pipeline" }
            </button>
            <button onclick={on_delete} disabled={busy} data-testid="delete-pipeline">
                { "Delete pipeline" }
            </button>
            { status_line(&status) }
            <div class="notifications">
                <input
                    type="email"
                    value={(*email).clone()}
                    oninput={on_email}
                    placeholder="ops@example.com"
                    data-testid="notify-email"
                />
                <button onclick={on_notify} data-testid="notify-button">{ "Notify me" }</button>
                if let Some(error) = &*email_error {
                    <div class="error-message">{ error }</div>
                }
            </div>
            { log_list(&monitoring) }
        </div>
    }
}
