//! Step 4: schedule and transformations

use web_sys::{Event, HtmlInputElement, HtmlSelectElement};
use wizard_core::validators::validate_etl_config;
use wizard_core::{
    EtlConfig, Schedule, ScheduleKind, TransformationKind, WizardAction, WizardUpdate,
};
use yew::prelude::*;

use crate::app::WizardProps;

/// Config the screen starts from: what the wizard holds, else a daily cron
pub fn initial_config(saved: Option<&EtlConfig>) -> EtlConfig {
    saved.cloned().unwrap_or_else(|| EtlConfig {
        schedule: Some(Schedule::with_defaults(ScheduleKind::Cron)),
        transformations: Vec::new(),
    })
}

fn schedule_kind_from(value: &str) -> ScheduleKind {
    match value {
        "interval" => ScheduleKind::Interval,
        _ => ScheduleKind::Cron,
    }
}

#[function_component(EtlConfigStep)]
pub fn etl_config_step(props: &WizardProps) -> Html {
    let saved = props.wizard.0.data().etl_config.clone();
    let draft = use_state(|| initial_config(saved.as_ref()));
    let new_kind = use_state(|| TransformationKind::Filter);
    let new_name = use_state(String::new);
    let errors = use_state(Vec::<String>::new);

    let kind = draft
        .schedule
        .as_ref()
        .map(|s| s.kind)
        .unwrap_or(ScheduleKind::Cron);

    let on_schedule_kind = {
        let draft = draft.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let mut next = (*draft).clone();
            next.schedule = Some(Schedule::with_defaults(schedule_kind_from(&select.value())));
            draft.set(next);
        })
    };

    let on_cron = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = (*draft).clone();
            next.schedule = Some(Schedule::cron(input.value()));
            draft.set(next);
        })
    };

    let on_interval = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = (*draft).clone();
            next.schedule = match input.value().trim().parse::<u64>() {
                Ok(seconds) => Some(Schedule::every(seconds)),
                Err(_) => Some(Schedule {
                    kind: ScheduleKind::Interval,
                    cron: None,
                    interval: None,
                }),
            };
            draft.set(next);
        })
    };

    let on_new_kind = {
        let new_kind = new_kind.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            if let Some(kind) = TransformationKind::from_id(&select.value()) {
                new_kind.set(kind);
            }
        })
    };

    let on_new_name = {
        let new_name = new_name.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            new_name.set(input.value());
        })
    };

    let on_add = {
        let draft = draft.clone();
        let new_kind = new_kind.clone();
        let new_name = new_name.clone();
        Callback::from(move |_: MouseEvent| {
            let name = match new_name.trim() {
                "" => new_kind.label().to_string(),
                name => name.to_string(),
            };
            let mut next = (*draft).clone();
            next.add_transformation(*new_kind, name);
            draft.set(next);
            new_name.set(String::new());
        })
    };

    let on_save = {
        let draft = draft.clone();
        let errors = errors.clone();
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| {
            let validation = validate_etl_config(&draft);
            if validation.is_valid {
                errors.set(Vec::new());
                wizard.dispatch(WizardAction::UpdateData(WizardUpdate::etl_config(
                    (*draft).clone(),
                )));
            } else {
                errors.set(validation.errors);
            }
        })
    };

    let cron_value = draft
        .schedule
        .as_ref()
        .and_then(|s| s.cron.clone())
        .unwrap_or_default();
    let interval_value = draft
        .schedule
        .as_ref()
        .and_then(|s| s.interval)
        .map(|i| i.to_string())
        .unwrap_or_default();

    html! {
        <div class="etl-config-step">
            <fieldset class="schedule">
                <legend>{ "Schedule" }</legend>
                <select onchange={on_schedule_kind} data-testid="schedule-kind">
                    <option value="cron" selected={kind == ScheduleKind::Cron}>{ "Cron expression" }</option>
                    <option value="interval" selected={kind == ScheduleKind::Interval}>{ "Fixed interval" }</option>
                </select>
                if kind == ScheduleKind::Interval {
                    <input
                        type="number"
                        min="1"
                        value={interval_value}
                        oninput={on_interval}
                        placeholder="seconds"
                        data-testid="schedule-interval"
                    />
                } else {
                    <input
                        type="text"
                        value={cron_value}
                        oninput={on_cron}
                        placeholder={Schedule::DEFAULT_CRON}
                        data-testid="schedule-cron"
                    />
                }
            </fieldset>

            <fieldset class="transformations">
                <legend>{ "Transformations" }</legend>
                <ul data-testid="transformation-list">
                    { for draft.transformations.iter().map(|t| {
                        let id = t.id;
                        let draft = draft.clone();
                        let on_remove = Callback::from(move |_: MouseEvent| {
                            let mut next = (*draft).clone();
                            next.remove_transformation(id);
                            draft.set(next);
                        });
                        html! {
                            <li key={id.to_string()}>
                                <span class="kind">{ t.kind.id() }</span>
                                { " " }{ &t.name }
                                <button onclick={on_remove}>{ "Remove" }</button>
                            </li>
                        }
                    })}
                </ul>
                <select onchange={on_new_kind} data-testid="transformation-kind">
                    { for TransformationKind::ALL.into_iter().map(|k| html! {
                        <option value={k.id()} selected={k == *new_kind}>{ k.label() }</option>
                    })}
                </select>
                <input
                    type="text"
                    value={(*new_name).clone()}
                    oninput={on_new_name}
                    placeholder="Name"
                />
                <button onclick={on_add} data-testid="add-transformation">{ "Add" }</button>
            </fieldset>

            if !errors.is_empty() {
                <ul class="error-message" data-testid="step-error">
                    { for errors.iter().map(|e| html! { <li>{ e }</li> }) }
                </ul>
            }
            <button onclick={on_save} data-testid="save-config">{ "Save configuration" }</button>
            if saved.is_some() {
                <span class="saved">{ "Saved" }</span>
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_config_defaults_to_daily_cron() {
        let config = initial_config(None);
        assert_eq!(config.schedule, Some(Schedule::cron(Schedule::DEFAULT_CRON)));
        assert!(validate_etl_config(&config).is_valid);
    }

    #[test]
    fn test_initial_config_keeps_saved() {
        let saved = EtlConfig {
            schedule: Some(Schedule::every(60)),
            transformations: Vec::new(),
        };
        assert_eq!(initial_config(Some(&saved)), saved);
    }

    #[test]
    fn test_schedule_kind_from_select_value() {
        assert_eq!(schedule_kind_from("interval"), ScheduleKind::Interval);
        assert_eq!(schedule_kind_from("cron"), ScheduleKind::Cron);
    }
}
