//! Nexus Sandbox - interactive mesh, microgrid and nano canvases
//!
//! `core` holds the simulation and is shared by both front-ends:
//! - the egui browser app (feature `wasm`), with a `BroadcastChannel`
//!   signal bus between tabs and `fetch` for the AI collaborator
//! - the headless `sandbox-cli` (feature `cli`), with a tokio broadcast
//!   bus between sessions and `ureq` for the AI collaborator

pub mod core;
pub mod time;

#[cfg(feature = "cli")]
pub mod bus_native;
#[cfg(feature = "cli")]
pub mod gemini_native;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod app;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod bus_wasm;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod gemini_wasm;
#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod theme;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod web {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;

    use crate::app::SandboxApp;

    #[wasm_bindgen(start)]
    pub fn main() {
        console_error_panic_hook::set_once();

        // Initialize tracing for browser console
        tracing_wasm::set_as_global_default();

        let web_options = eframe::WebOptions::default();

        wasm_bindgen_futures::spawn_local(async {
            let Some(canvas) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("canvas"))
                .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
            else {
                tracing::error!("No <canvas id=\"canvas\"> element");
                return;
            };

            if let Err(e) = eframe::WebRunner::new()
                .start(
                    canvas,
                    web_options,
                    Box::new(|cc| Ok(Box::new(SandboxApp::new(cc)))),
                )
                .await
            {
                tracing::error!(?e, "Failed to start eframe");
            }
        });
    }
}
