//! Back / Next / Finish buttons and the step gate's error list

use wizard_core::WizardAction;
use yew::prelude::*;

use crate::app::WizardProps;

#[function_component(Navigation)]
pub fn navigation(props: &WizardProps) -> Html {
    let machine = &props.wizard.0;
    let step = machine.current_step();

    let on_back = {
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| wizard.dispatch(WizardAction::PrevStep))
    };

    let on_next = {
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| {
            wizard.dispatch(WizardAction::SyncStepErrors);
            wizard.dispatch(WizardAction::NextStep);
        })
    };

    let on_finish = {
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| wizard.dispatch(WizardAction::Complete))
    };

    let on_restart = {
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| wizard.dispatch(WizardAction::Reset))
    };

    html! {
        <nav class="wizard-navigation">
            if !machine.errors().is_empty() {
                <ul class="wizard-errors" data-testid="wizard-errors">
                    { for machine.errors().values().map(|message| html! { <li>{ message }</li> }) }
                </ul>
            }
            <button
                onclick={on_back}
                disabled={step.prev().is_none()}
                data-testid="back-button"
            >
                { "Back" }
            </button>
            if machine.is_completed() {
                <span class="wizard-done">{ "Wizard completed" }</span>
                <button onclick={on_restart} data-testid="restart-button">{ "Start over" }</button>
            } else if step.is_last() {
                <button onclick={on_finish} data-testid="finish-button">{ "Finish" }</button>
            } else {
                <button
                    onclick={on_next}
                    class={classes!((!machine.can_proceed()).then_some("blocked"))}
                    data-testid="next-button"
                >
                    { "Next" }
                </button>
            }
        </nav>
    }
}
