//! Step 1: pick a file and upload it

use wasm_bindgen_futures::spawn_local;
use web_sys::{Event, File, HtmlInputElement};
use wizard_core::validators::{file_type_for, validate_file};
use wizard_core::wire::storage_path;
use wizard_core::{FileInfo, FileRules, SourceConfig, SourceKind, WizardAction, WizardUpdate};
use yew::prelude::*;

use super::status_line;
use crate::app::{use_api, WizardProps};
use crate::components::OperationStatus;
use crate::hooks::use_liveness;

fn file_info(file: &File) -> FileInfo {
    FileInfo::new(file.name(), file.size() as u64)
}

#[function_component(DataSourceStep)]
pub fn data_source_step(props: &WizardProps) -> Html {
    let api = use_api();
    let liveness = use_liveness();
    let selected = use_state(|| None::<File>);
    let status = use_state(OperationStatus::default);

    let on_change = {
        let selected = selected.clone();
        let status = status.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let file = input.files().and_then(|files| files.get(0));
            let info = file.as_ref().map(file_info);
            let validation = validate_file(info.as_ref(), &FileRules::default());
            if validation.is_valid {
                status.set(OperationStatus::done());
                selected.set(file);
            } else {
                status.set(OperationStatus::failed(validation.message()));
                selected.set(None);
            }
        })
    };

    let on_upload = {
        let selected = selected.clone();
        let status = status.clone();
        let wizard = props.wizard.clone();
        Callback::from(move |_: MouseEvent| {
            let Some(file) = (*selected).clone() else {
                status.set(OperationStatus::failed("No file selected"));
                return;
            };
            let validation = validate_file(Some(&file_info(&file)), &FileRules::default());
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
                let result = api.upload_file(&file).await;
                if !token.is_live() {
                    return;
                }
                match result {
                    Ok(response) => {
                        let name = file.name();
                        gloo::console::log!(format!("uploaded {} as {}", name, response.file_id));
                        let source = SourceConfig {
                            kind: SourceKind::File,
                            file_type: file_type_for(&name),
                            file_size: Some(file.size() as u64),
                            storage_path: Some(storage_path(&response.file_id, &name)),
                            file_id: Some(response.file_id),
                            file_name: Some(name),
                        };
                        wizard.dispatch(WizardAction::UpdateData(WizardUpdate::source(source)));
                        status.set(OperationStatus::done());
                    }
                    Err(error) => status.set(OperationStatus::failed(error.message)),
                }
            });
        })
    };

    let uploaded = props.wizard.0.data().source.clone();

    html! {
        <div class="data-source-step">
            <input
                type="file"
                accept=".csv,.json,.xml"
                onchange={on_change}
                data-testid="file-input"
            />
            if let Some(file) = &*selected {
                <p class="file-summary">
                    { format!("{} ({} bytes)", file.name(), file.size() as u64) }
                </p>
            }
            <button
                onclick={on_upload}
                disabled={status.loading || selected.is_none()}
                data-testid="upload-button"
            >
                { if status.loading { "Uploading..." } else { "Upload" } }
            </button>
            { status_line(&status) }
            if let Some(source) = uploaded.filter(|s| s.is_uploaded()) {
                <div class="upload-result" data-testid="upload-result">
                    <strong>{ "Uploaded: " }</strong>
                    { source.file_name.clone().unwrap_or_default() }
                    <code>{ source.storage_path.clone().unwrap_or_default() }</code>
                </div>
            }
        </div>
    }
}

