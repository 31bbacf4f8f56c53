//! One screen per wizard step

mod analysis;
mod data_source;
mod etl_config;
mod monitoring;
mod target;
mod visualization;

pub use analysis::AnalysisStep;
pub use data_source::DataSourceStep;
pub use etl_config::EtlConfigStep;
pub use monitoring::MonitoringStep;
pub use target::TargetStep;
pub use visualization::VisualizationStep;

use yew::prelude::*;

use super::OperationStatus;

/// Error line under a step's action buttons
pub(crate) fn status_line(status: &OperationStatus) -> Html {
    match &status.error {
        Some(message) => html! {
            <div class="error-message" data-testid="step-error">{ message }</div>
        },
        None => html! {},
    }
}
