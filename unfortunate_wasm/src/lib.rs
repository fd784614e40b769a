use wasm_bindgen::prelude::*;

mod app;
mod canvas;
mod history_view;
mod item_list;
mod storage;
mod wheel_view;

pub use app::App;

#[wasm_bindgen(start)]
pub fn run() {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();
    yew::Renderer::<App>::new().render();
}
