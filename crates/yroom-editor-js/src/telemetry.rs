//! Console logging for the page.

use tracing::Level;
use tracing::subscriber::set_global_default;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

pub(crate) fn init() {
    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let wasm_layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );

    // quiet dependencies, keep our own crates at the console level
    let filter = EnvFilter::new(format!(
        "warn,yroom_editor_core={console_level},yroom_editor_browser={console_level},yroom_editor_js={console_level}"
    ));

    let reg = Registry::default().with(filter).with(wasm_layer);

    // a host page may have installed a subscriber already
    let _ = set_global_default(reg);
}
