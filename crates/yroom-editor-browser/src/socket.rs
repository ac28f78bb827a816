//! Binary `WebSocket` connections for the providers.

use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use js_sys::{ArrayBuffer, Uint8Array};
use wasm_bindgen::JsCast;
use web_sys::{BinaryType, CloseEvent, MessageEvent, WebSocket};
use yroom_editor_core::{ConnectionEvents, ConnectionTarget, Connector, Transport, TransportError};

use crate::js_message;

/// Opens browser `WebSocket`s.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserConnector;

impl Connector for BrowserConnector {
    fn connect(
        &self,
        target: &ConnectionTarget,
        events: Rc<dyn ConnectionEvents>,
    ) -> Result<Rc<dyn Transport>, TransportError> {
        let socket = WebSocket::new(&target.url).map_err(|e| TransportError::Connect {
            url: target.url.clone(),
            reason: js_message(e),
        })?;
        socket.set_binary_type(BinaryType::Arraybuffer);
        tracing::debug!(url = %target.url, room = %target.room, "websocket opening");

        Ok(Rc::new(WebSocketTransport::attach(socket, events)))
    }
}

/// An open (or opening) socket and the listeners feeding its provider.
///
/// Dropping the transport detaches the listeners.
pub struct WebSocketTransport {
    socket: WebSocket,
    listeners: RefCell<Vec<EventListener>>,
}

impl WebSocketTransport {
    pub fn attach(socket: WebSocket, events: Rc<dyn ConnectionEvents>) -> Self {
        let on_open = {
            let events = events.clone();
            EventListener::new(&socket, "open", move |_| events.on_open())
        };

        let on_message = {
            let events = events.clone();
            EventListener::new(&socket, "message", move |event| {
                let Some(event) = event.dyn_ref::<MessageEvent>() else {
                    return;
                };
                let data = event.data();
                if data.is_instance_of::<ArrayBuffer>() {
                    events.on_frame(&Uint8Array::new(&data).to_vec());
                } else {
                    tracing::trace!("ignoring text frame");
                }
            })
        };

        let on_close = {
            let events = events.clone();
            EventListener::new(&socket, "close", move |event| {
                let reason = event
                    .dyn_ref::<CloseEvent>()
                    .map(|close| close.reason())
                    .filter(|reason| !reason.is_empty());
                events.on_close(reason.as_deref());
            })
        };

        // browsers follow every error with a close event
        let on_error = EventListener::new(&socket, "error", |_| {
            tracing::warn!("websocket error");
        });

        Self {
            socket,
            listeners: RefCell::new(vec![on_open, on_message, on_close, on_error]),
        }
    }

    pub fn socket(&self) -> &WebSocket {
        &self.socket
    }
}

impl Transport for WebSocketTransport {
    fn send(&self, frame: &[u8]) -> Result<(), TransportError> {
        if self.socket.ready_state() != WebSocket::OPEN {
            return Err(TransportError::NotOpen);
        }
        self.socket
            .send_with_u8_array(frame)
            .map_err(|e| TransportError::Send(js_message(e)))
    }

    fn close(&self) {
        self.listeners.borrow_mut().clear();
        if let Err(e) = self.socket.close() {
            tracing::debug!(error = %js_message(e), "websocket close failed");
        }
    }
}
