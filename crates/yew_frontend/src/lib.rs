//! ETL pipeline wizard Yew frontend

mod app;
mod components;
mod fallback;
mod hooks;
mod services;

pub use app::App;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn run_app() {
    fallback::install();

    yew::Renderer::<App>::new().render();
}
