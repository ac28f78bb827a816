//! Keydown translation and listener wiring.

use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{EventTarget, KeyboardEvent};
use yroom_editor_core::{Key, KeyCombo, KeydownResult, Modifiers};

/// Convert a DOM keyboard event to a key combination.
pub fn key_combo(event: &KeyboardEvent) -> KeyCombo {
    KeyCombo::with_modifiers(
        Key::from_name(&event.key()),
        Modifiers {
            ctrl: event.ctrl_key(),
            alt: event.alt_key(),
            shift: event.shift_key(),
            meta: event.meta_key(),
        },
    )
}

/// Route keydown events on `target` through `handler`.
///
/// Handled keys have their default action prevented. Keys pressed during
/// IME composition never reach the handler. The listener is removed when
/// the returned value is dropped.
pub fn listen_keydown<F>(target: &EventTarget, handler: F) -> EventListener
where
    F: Fn(&KeyCombo) -> KeydownResult + 'static,
{
    EventListener::new_with_options(
        target,
        "keydown",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            if event.is_composing() {
                return;
            }
            let combo = key_combo(event);
            if handler(&combo) == KeydownResult::Handled {
                event.prevent_default();
            }
        },
    )
}
