//! Main application component and the wizard store

use std::rc::Rc;
use wizard_core::{WizardAction, WizardMachine, WizardStep};
use yew::prelude::*;

use crate::components::navigation::Navigation;
use crate::components::progress::ProgressIndicator;
use crate::components::steps::{
    AnalysisStep, DataSourceStep, EtlConfigStep, MonitoringStep, TargetStep, VisualizationStep,
};
use crate::services::BrowserApi;

/// Reducer state handed to every component through context
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardStore(pub WizardMachine);

impl Reducible for WizardStore {
    type Action = WizardAction;

    fn reduce(self: Rc<Self>, action: WizardAction) -> Rc<Self> {
        let mut machine = self.0.clone();
        machine.dispatch(action);
        if machine == self.0 {
            self
        } else {
            Rc::new(Self(machine))
        }
    }
}

pub type WizardHandle = UseReducerHandle<WizardStore>;

/// Props for components that read or drive the wizard
#[derive(Properties, PartialEq)]
pub struct WizardProps {
    pub wizard: WizardHandle,
}

#[hook]
pub fn use_api() -> BrowserApi {
    use_context::<BrowserApi>().unwrap_or_default()
}

#[function_component(App)]
pub fn app() -> Html {
    let wizard = use_reducer(WizardStore::default);
    let api = use_memo((), |_| BrowserApi::default());

    let body = match wizard.0.current_step() {
        WizardStep::DataSource => html! { <DataSourceStep wizard={wizard.clone()} /> },
        WizardStep::Analysis => html! { <AnalysisStep wizard={wizard.clone()} /> },
        WizardStep::TargetSystem => html! { <TargetStep wizard={wizard.clone()} /> },
        WizardStep::EtlConfig => html! { <EtlConfigStep wizard={wizard.clone()} /> },
        WizardStep::Visualization => html! { <VisualizationStep wizard={wizard.clone()} /> },
        WizardStep::Monitoring => html! { <MonitoringStep wizard={wizard.clone()} /> },
    };

    html! {
        <ContextProvider<BrowserApi> context={(*api).clone()}>
            <div class="app">
                <header class="app-header">
                    <h1>{ "ETL Pipeline Wizard" }</h1>
                    <p>{ "Upload data, analyze it and generate a pipeline" }</p>
                </header>
                <main class="app-main">
                    <ProgressIndicator wizard={wizard.clone()} />
                    <section class="wizard-step" data-testid="wizard-step">
                        <h2>{ wizard.0.current_step().title() }</h2>
                        { body }
                    </section>
                    <Navigation wizard={wizard} />
                </main>
            </div>
        </ContextProvider<BrowserApi>>
    }
}
