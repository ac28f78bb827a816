//! WASM bindings for yroom collaborative editors.
//!
//! A room page loads this module and calls `startFromPage()`. The editor
//! variant, room and socket path all come from the page's settings element.

mod session;
mod telemetry;

pub use session::*;

use wasm_bindgen::prelude::*;

/// Initialize panic hook and console logging.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    telemetry::init();
}
