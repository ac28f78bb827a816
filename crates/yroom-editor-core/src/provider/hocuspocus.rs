use smol_str::SmolStr;

use super::{Framing, Inbound, Outbound};
use crate::error::ProtocolError;
use crate::protocol::{AuthMessage, HocusFrame, HocusMessage};

/// Hocuspocus framing for one document on the socket.
#[derive(Debug, Clone)]
pub struct HocuspocusFraming {
    document: SmolStr,
    token: SmolStr,
}

impl HocuspocusFraming {
    /// `token` is sent on open; the server expects a token frame even when
    /// it does not check credentials, so `None` sends an empty one.
    pub fn new(document: impl Into<SmolStr>, token: Option<SmolStr>) -> Self {
        Self {
            document: document.into(),
            token: token.unwrap_or_default(),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }
}

impl Framing for HocuspocusFraming {
    fn encode(&self, message: Outbound) -> Vec<u8> {
        let message = match message {
            Outbound::Sync(sync) => HocusMessage::Sync(sync),
            Outbound::Awareness(update) => HocusMessage::Awareness(update),
            Outbound::QueryAwareness => HocusMessage::QueryAwareness,
            Outbound::Token(token) => HocusMessage::Auth(AuthMessage::Token(token)),
        };
        HocusFrame::new(self.document.clone(), message).encode()
    }

    fn decode(&self, frame: &[u8]) -> Result<Inbound, ProtocolError> {
        let frame = HocusFrame::decode(frame)?;
        if frame.document != self.document {
            return Ok(Inbound::Ignored);
        }
        Ok(match frame.message {
            HocusMessage::Sync(sync) | HocusMessage::SyncReply(sync) => Inbound::Sync(sync),
            HocusMessage::Awareness(update) => Inbound::Awareness(update),
            HocusMessage::QueryAwareness => Inbound::QueryAwareness,
            HocusMessage::Auth(AuthMessage::PermissionDenied(reason)) => Inbound::Denied(reason),
            HocusMessage::Auth(AuthMessage::Authenticated(scope)) => Inbound::Authenticated(scope),
            // only clients send tokens
            HocusMessage::Auth(AuthMessage::Token(_)) => Inbound::Ignored,
            HocusMessage::Stateless(payload) => Inbound::Stateless(payload),
            HocusMessage::Close { reason, .. } => Inbound::Closed(reason),
            HocusMessage::SyncStatus(saved) => Inbound::SyncStatus(saved),
        })
    }

    fn handshake(&self) -> Vec<Outbound> {
        vec![Outbound::Token(self.token.to_string())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::SyncMessage;

    #[test]
    fn test_other_documents_ignored() {
        let framing = HocuspocusFraming::new("room1", None);
        let frame = HocusFrame::new("room2", HocusMessage::QueryAwareness).encode();
        assert_eq!(framing.decode(&frame).unwrap(), Inbound::Ignored);
    }

    #[test]
    fn test_sync_reply_handled_as_sync() {
        let framing = HocuspocusFraming::new("room1", None);
        let frame = HocusFrame::new(
            "room1",
            HocusMessage::SyncReply(SyncMessage::Step2(vec![0, 0])),
        )
        .encode();
        assert_eq!(
            framing.decode(&frame).unwrap(),
            Inbound::Sync(SyncMessage::Step2(vec![0, 0]))
        );
    }

    #[test]
    fn test_handshake_sends_empty_token_by_default() {
        let framing = HocuspocusFraming::new("room1", None);
        assert_eq!(framing.handshake(), vec![Outbound::Token(String::new())]);
    }

    #[test]
    fn test_outbound_frames_name_the_document() {
        let framing = HocuspocusFraming::new("room1", Some("secret".into()));
        let bytes = framing.encode(Outbound::Token("secret".into()));
        let frame = HocusFrame::decode(&bytes).unwrap();
        assert_eq!(frame.document, "room1");
        assert_eq!(
            frame.message,
            HocusMessage::Auth(AuthMessage::Token("secret".into()))
        );
    }
}
