//! Step 3: choose the storage system the pipeline loads into

use wizard_core::{TargetSelection, TargetSystem, WizardAction, WizardUpdate};
use yew::prelude::*;

use crate::app::WizardProps;

/// Target the analysis recommended, matched by name or id
pub fn recommended_system(recommendation: &str) -> Option<TargetSystem> {
    TargetSystem::ALL.into_iter().find(|system| {
        system.info().name.eq_ignore_ascii_case(recommendation.trim())
            || system.id().eq_ignore_ascii_case(recommendation.trim())
    })
}

#[function_component(TargetStep)]
pub fn target_step(props: &WizardProps) -> Html {
    let data = props.wizard.0.data();
    let selected = data.target.as_ref().map(|t| t.system);
    let recommended = data
        .analysis
        .as_ref()
        .and_then(|a| recommended_system(a.recommended_storage()));

    html! {
        <div class="target-step">
            <div class="target-cards">
                { for TargetSystem::ALL.into_iter().map(|system| {
                    let info = system.info();
                    let wizard = props.wizard.clone();
                    let onclick = Callback::from(move |_: MouseEvent| {
                        wizard.dispatch(WizardAction::UpdateData(WizardUpdate::target(
                            TargetSelection::with_defaults(system),
                        )));
                    });
                    let class = classes!(
                        "target-card",
                        (selected == Some(system)).then_some("selected"),
                    );
                    html! {
                        <div {class} {onclick} data-testid={format!("target-{}", system.id())}>
                            <h3>{ info.name }</h3>
                            if recommended == Some(system) {
                                <span class="badge">{ "Recommended" }</span>
                            }
                            <p>{ info.description }</p>
                            <ul>
                                { for info.features.iter().map(|feature| html! { <li>{ *feature }</li> }) }
                            </ul>
                        </div>
                    }
                })}
            </div>
        </div>
    }
}
