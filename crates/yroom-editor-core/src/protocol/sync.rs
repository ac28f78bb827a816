//! y-protocols message framing used by y-websocket servers.

use yrs::encoding::read::{Cursor, Read};
use yrs::encoding::write::Write;

use crate::error::ProtocolError;

pub const MSG_SYNC: u32 = 0;
pub const MSG_AWARENESS: u32 = 1;
pub const MSG_AUTH: u32 = 2;
pub const MSG_QUERY_AWARENESS: u32 = 3;

pub const MSG_SYNC_STEP_1: u32 = 0;
pub const MSG_SYNC_STEP_2: u32 = 1;
pub const MSG_SYNC_UPDATE: u32 = 2;

const AUTH_PERMISSION_DENIED: u32 = 0;

/// Document sync sub-message. Payloads are v1-encoded `yrs` structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncMessage {
    /// Sender's state vector; the receiver answers with `Step2`.
    Step1(Vec<u8>),
    /// Everything the peer was missing.
    Step2(Vec<u8>),
    /// Incremental update broadcast after the handshake.
    Update(Vec<u8>),
}

impl SyncMessage {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        let (tag, payload) = match self {
            SyncMessage::Step1(sv) => (MSG_SYNC_STEP_1, sv),
            SyncMessage::Step2(update) => (MSG_SYNC_STEP_2, update),
            SyncMessage::Update(update) => (MSG_SYNC_UPDATE, update),
        };
        buf.write_var(tag);
        buf.write_buf(payload);
    }

    pub fn decode(cursor: &mut Cursor<'_>) -> Result<Self, ProtocolError> {
        let tag: u32 = cursor.read_var()?;
        let payload = cursor.read_buf()?.to_vec();
        match tag {
            MSG_SYNC_STEP_1 => Ok(SyncMessage::Step1(payload)),
            MSG_SYNC_STEP_2 => Ok(SyncMessage::Step2(payload)),
            MSG_SYNC_UPDATE => Ok(SyncMessage::Update(payload)),
            other => Err(ProtocolError::UnknownMessage(other as u64)),
        }
    }
}

/// A top-level y-websocket frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Sync(SyncMessage),
    Awareness(Vec<u8>),
    /// The server refused access, with its reason.
    AuthDenied(String),
    QueryAwareness,
}

impl Message {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Message::Sync(sync) => {
                buf.write_var(MSG_SYNC);
                sync.encode(&mut buf);
            }
            Message::Awareness(update) => {
                buf.write_var(MSG_AWARENESS);
                buf.write_buf(update);
            }
            Message::AuthDenied(reason) => {
                buf.write_var(MSG_AUTH);
                buf.write_var(AUTH_PERMISSION_DENIED);
                buf.write_string(reason);
            }
            Message::QueryAwareness => buf.write_var(MSG_QUERY_AWARENESS),
        }
        buf
    }

    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        let mut cursor = Cursor::new(frame);
        let tag: u32 = cursor.read_var()?;
        match tag {
            MSG_SYNC => Ok(Message::Sync(SyncMessage::decode(&mut cursor)?)),
            MSG_AWARENESS => Ok(Message::Awareness(cursor.read_buf()?.to_vec())),
            MSG_AUTH => {
                let kind: u32 = cursor.read_var()?;
                if kind != AUTH_PERMISSION_DENIED {
                    return Err(ProtocolError::UnknownMessage(kind as u64));
                }
                Ok(Message::AuthDenied(cursor.read_string()?.to_string()))
            }
            MSG_QUERY_AWARENESS => Ok(Message::QueryAwareness),
            other => Err(ProtocolError::UnknownMessage(other as u64)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step1_layout() {
        let frame = Message::Sync(SyncMessage::Step1(vec![0])).encode();
        // sync, step1, length-prefixed empty state vector
        assert_eq!(frame, vec![0, 0, 1, 0]);
    }

    #[test]
    fn test_update_decodes() {
        let frame = vec![0, 2, 3, 9, 8, 7];
        assert_eq!(
            Message::decode(&frame).unwrap(),
            Message::Sync(SyncMessage::Update(vec![9, 8, 7]))
        );
    }

    #[test]
    fn test_auth_denied() {
        let frame = Message::AuthDenied("nope".into()).encode();
        assert_eq!(
            Message::decode(&frame).unwrap(),
            Message::AuthDenied("nope".into())
        );
    }

    #[test]
    fn test_query_awareness_is_single_byte() {
        assert_eq!(Message::QueryAwareness.encode(), vec![3]);
    }

    #[test]
    fn test_unknown_type() {
        assert!(matches!(
            Message::decode(&[42]),
            Err(ProtocolError::UnknownMessage(42))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        assert!(matches!(
            Message::decode(&[0, 1, 5, 1]),
            Err(ProtocolError::Decode(_))
        ));
    }
}
