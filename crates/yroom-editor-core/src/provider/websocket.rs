use super::{Framing, Inbound, Outbound};
use crate::error::ProtocolError;
use crate::protocol::Message;

/// y-websocket framing. The room is part of the socket URL, so frames carry
/// no document name.
#[derive(Debug, Clone, Copy, Default)]
pub struct YWebsocketFraming;

impl Framing for YWebsocketFraming {
    fn encode(&self, message: Outbound) -> Vec<u8> {
        match message {
            Outbound::Sync(sync) => Message::Sync(sync).encode(),
            Outbound::Awareness(update) => Message::Awareness(update).encode(),
            Outbound::QueryAwareness => Message::QueryAwareness.encode(),
            // y-websocket authenticates at the HTTP upgrade
            Outbound::Token(_) => Vec::new(),
        }
    }

    fn decode(&self, frame: &[u8]) -> Result<Inbound, ProtocolError> {
        Ok(match Message::decode(frame)? {
            Message::Sync(sync) => Inbound::Sync(sync),
            Message::Awareness(update) => Inbound::Awareness(update),
            Message::AuthDenied(reason) => Inbound::Denied(reason),
            Message::QueryAwareness => Inbound::QueryAwareness,
        })
    }
}
