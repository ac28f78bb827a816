//! Hocuspocus framing.
//!
//! Every frame starts with the document name, so one socket can carry
//! several documents. Sync and awareness payloads are the y-protocols ones.

use smol_str::SmolStr;
use yrs::encoding::read::{Cursor, Read};
use yrs::encoding::write::Write;

use super::sync::SyncMessage;
use crate::error::ProtocolError;

pub const MSG_SYNC: u32 = 0;
pub const MSG_AWARENESS: u32 = 1;
pub const MSG_AUTH: u32 = 2;
pub const MSG_QUERY_AWARENESS: u32 = 3;
pub const MSG_SYNC_REPLY: u32 = 4;
pub const MSG_STATELESS: u32 = 5;
pub const MSG_CLOSE: u32 = 7;
pub const MSG_SYNC_STATUS: u32 = 8;

const AUTH_TOKEN: u32 = 0;
const AUTH_PERMISSION_DENIED: u32 = 1;
const AUTH_AUTHENTICATED: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMessage {
    /// Client credential. Sent even when empty; the server waits for it.
    Token(String),
    PermissionDenied(String),
    /// Access granted, with the scope (`read-write` or `readonly`).
    Authenticated(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HocusMessage {
    Sync(SyncMessage),
    Awareness(Vec<u8>),
    Auth(AuthMessage),
    QueryAwareness,
    /// Server's answer to our Step1; handled like `Sync`.
    SyncReply(SyncMessage),
    Stateless(String),
    Close { code: Option<u32>, reason: Option<String> },
    /// Whether the server persisted our last update.
    SyncStatus(bool),
}

/// One frame addressed to `document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HocusFrame {
    pub document: SmolStr,
    pub message: HocusMessage,
}

impl HocusFrame {
    pub fn new(document: impl Into<SmolStr>, message: HocusMessage) -> Self {
        Self {
            document: document.into(),
            message,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_string(&self.document);
        match &self.message {
            HocusMessage::Sync(sync) => {
                buf.write_var(MSG_SYNC);
                sync.encode(&mut buf);
            }
            HocusMessage::SyncReply(sync) => {
                buf.write_var(MSG_SYNC_REPLY);
                sync.encode(&mut buf);
            }
            HocusMessage::Awareness(update) => {
                buf.write_var(MSG_AWARENESS);
                buf.write_buf(update);
            }
            HocusMessage::Auth(auth) => {
                buf.write_var(MSG_AUTH);
                let (kind, text) = match auth {
                    AuthMessage::Token(t) => (AUTH_TOKEN, t),
                    AuthMessage::PermissionDenied(r) => (AUTH_PERMISSION_DENIED, r),
                    AuthMessage::Authenticated(s) => (AUTH_AUTHENTICATED, s),
                };
                buf.write_var(kind);
                buf.write_string(text);
            }
            HocusMessage::QueryAwareness => buf.write_var(MSG_QUERY_AWARENESS),
            HocusMessage::Stateless(payload) => {
                buf.write_var(MSG_STATELESS);
                buf.write_string(payload);
            }
            HocusMessage::Close { code, reason } => {
                buf.write_var(MSG_CLOSE);
                if let Some(code) = code {
                    buf.write_var(*code);
                    if let Some(reason) = reason {
                        buf.write_string(reason);
                    }
                }
            }
            HocusMessage::SyncStatus(saved) => {
                buf.write_var(MSG_SYNC_STATUS);
                buf.write_var(u32::from(*saved));
            }
        }
        buf
    }

    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let mut cursor = Cursor::new(frame);
        let document = SmolStr::new(cursor.read_string()?);
        let tag: u32 = cursor.read_var()?;
        let message = match tag {
            MSG_SYNC => HocusMessage::Sync(SyncMessage::decode(&mut cursor)?),
            MSG_SYNC_REPLY => HocusMessage::SyncReply(SyncMessage::decode(&mut cursor)?),
            MSG_AWARENESS => HocusMessage::Awareness(cursor.read_buf()?.to_vec()),
            MSG_AUTH => {
                let kind: u32 = cursor.read_var()?;
                let text = cursor.read_string()?.to_string();
                HocusMessage::Auth(match kind {
                    AUTH_TOKEN => AuthMessage::Token(text),
                    AUTH_PERMISSION_DENIED => AuthMessage::PermissionDenied(text),
                    AUTH_AUTHENTICATED => AuthMessage::Authenticated(text),
                    other => return Err(ProtocolError::UnknownMessage(other as u64)),
                })
            }
            MSG_QUERY_AWARENESS => HocusMessage::QueryAwareness,
            MSG_STATELESS => HocusMessage::Stateless(cursor.read_string()?.to_string()),
            MSG_CLOSE => {
                // both fields are optional on the wire
                let code = cursor.read_var::<u32>().ok();
                let reason = code
                    .and_then(|_| cursor.read_string().ok())
                    .map(str::to_string);
                HocusMessage::Close { code, reason }
            }
            MSG_SYNC_STATUS => HocusMessage::SyncStatus(cursor.read_var::<u32>()? != 0),
            other => return Err(ProtocolError::UnknownMessage(other as u64)),
        };
        Ok(Self { document, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_starts_with_document_name() {
        let frame = HocusFrame::new("room1", HocusMessage::QueryAwareness).encode();
        assert_eq!(frame, vec![5, b'r', b'o', b'o', b'm', b'1', 3]);
    }

    #[test]
    fn test_token_auth_roundtrip() {
        let frame = HocusFrame::new("doc", HocusMessage::Auth(AuthMessage::Token(String::new())));
        assert_eq!(HocusFrame::decode(&frame.encode()).unwrap(), frame);
    }

    #[test]
    fn test_sync_reply_carries_sync_payload() {
        let bytes = HocusFrame::new(
            "doc",
            HocusMessage::SyncReply(SyncMessage::Step2(vec![1, 2])),
        )
        .encode();
        let decoded = HocusFrame::decode(&bytes).unwrap();
        assert_eq!(
            decoded.message,
            HocusMessage::SyncReply(SyncMessage::Step2(vec![1, 2]))
        );
    }

    #[test]
    fn test_bare_close_has_no_reason() {
        let mut bytes = Vec::new();
        bytes.write_string("doc");
        bytes.write_var(MSG_CLOSE);
        let decoded = HocusFrame::decode(&bytes).unwrap();
        assert_eq!(
            decoded.message,
            HocusMessage::Close {
                code: None,
                reason: None
            }
        );
    }

    #[test]
    fn test_close_with_reason() {
        let frame = HocusFrame::new(
            "doc",
            HocusMessage::Close {
                code: Some(4401),
                reason: Some("Unauthorized".into()),
            },
        );
        assert_eq!(HocusFrame::decode(&frame.encode()).unwrap(), frame);
    }

    #[test]
    fn test_sync_status() {
        let frame = HocusFrame::new("doc", HocusMessage::SyncStatus(true)).encode();
        assert_eq!(*frame.last().unwrap(), 1);
    }

    #[test]
    fn test_unknown_auth_kind() {
        let mut bytes = Vec::new();
        bytes.write_string("doc");
        bytes.write_var(MSG_AUTH);
        bytes.write_var(9u32);
        bytes.write_string("");
        assert!(matches!(
            HocusFrame::decode(&bytes),
            Err(ProtocolError::UnknownMessage(9))
        ));
    }
}
