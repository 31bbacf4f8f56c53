//! Step indicator across the top of the wizard

use wizard_core::{WizardAction, WizardStep};
use yew::prelude::*;

use crate::app::WizardProps;

#[function_component(ProgressIndicator)]
pub fn progress_indicator(props: &WizardProps) -> Html {
    let current = props.wizard.0.current_step();

    html! {
        <ol class="wizard-progress" data-testid="wizard-progress">
            { for WizardStep::ALL.iter().map(|&step| {
                let wizard = props.wizard.clone();
                let onclick = Callback::from(move |_: MouseEvent| {
                    wizard.dispatch(WizardAction::SetStep(step));
                });
                let class = classes!(
                    "progress-step",
                    (step == current).then_some("active"),
                    (step < current).then_some("done"),
                );
                html! {
                    <li {class} {onclick}>
                        <span class="step-number">{ step.index() + 1 }</span>
                        <span class="step-title">{ step.title() }</span>
                    </li>
                }
            })}
        </ol>
    }
}
