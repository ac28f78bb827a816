//! Collaboration cursors.
//!
//! Each participant publishes its selection and identity under the `cursor`
//! and `user` awareness fields; the layer reads everyone else's back.
//!
//! Selections travel as plain `{anchor, head}` offsets. y-prosemirror and
//! TipTap peers publish and expect relative-position JSON in the same field,
//! so cursors are only exchanged between clients built on this crate; a
//! JavaScript peer's cursor does not parse here and ours is ignored there.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::awareness::ClientId;
use crate::presence::UserPresence;
use crate::provider::{Framing, Provider};

/// Where presence fields are published.
pub trait PresenceChannel {
    fn publish(&self, key: &str, value: Value);

    /// Current states of the other participants.
    fn peer_states(&self) -> Vec<(ClientId, Value)>;
}

impl<F: Framing> PresenceChannel for Provider<F> {
    fn publish(&self, key: &str, value: Value) {
        self.set_awareness_field(key, value);
    }

    fn peer_states(&self) -> Vec<(ClientId, Value)> {
        self.with_awareness(|awareness| {
            awareness
                .peers()
                .map(|(id, state)| (id, state.clone()))
                .collect()
        })
    }
}

/// A selection as offsets into the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: u32,
    pub head: u32,
}

/// Another participant's cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCursor {
    pub client_id: ClientId,
    pub selection: Selection,
    pub user: Option<UserPresence>,
}

pub struct CursorLayer {
    channel: Rc<dyn PresenceChannel>,
    user: Option<UserPresence>,
}

impl CursorLayer {
    /// Announces `user` right away so peers can label the cursor before the
    /// first selection change.
    pub fn new(channel: Rc<dyn PresenceChannel>, user: Option<UserPresence>) -> Self {
        if let Some(user) = &user {
            if let Ok(value) = serde_json::to_value(user) {
                channel.publish("user", value);
            }
        }
        Self { channel, user }
    }

    pub fn user(&self) -> Option<&UserPresence> {
        self.user.as_ref()
    }

    pub fn set_selection(&self, selection: Selection) {
        match serde_json::to_value(selection) {
            Ok(value) => self.channel.publish("cursor", value),
            Err(e) => tracing::warn!(error = %e, "cursor not serializable"),
        }
    }

    /// Peers with a published selection. Peers that only announced an
    /// identity are left out.
    pub fn remote_cursors(&self) -> Vec<RemoteCursor> {
        let mut cursors: Vec<_> = self
            .channel
            .peer_states()
            .into_iter()
            .filter_map(|(client_id, state)| {
                let selection = serde_json::from_value(state.get("cursor")?.clone()).ok()?;
                let user = state
                    .get("user")
                    .and_then(|u| serde_json::from_value(u.clone()).ok());
                Some(RemoteCursor {
                    client_id,
                    selection,
                    user,
                })
            })
            .collect();
        cursors.sort_by_key(|c| c.client_id);
        cursors
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorded {
        published: RefCell<Vec<(String, Value)>>,
        peers: Vec<(ClientId, Value)>,
    }

    impl PresenceChannel for Recorded {
        fn publish(&self, key: &str, value: Value) {
            self.published.borrow_mut().push((key.to_string(), value));
        }

        fn peer_states(&self) -> Vec<(ClientId, Value)> {
            self.peers.clone()
        }
    }

    #[test]
    fn test_user_published_on_creation() {
        let channel = Rc::new(Recorded::default());
        let _layer = CursorLayer::new(channel.clone(), Some(UserPresence::new("Ada", "#ff0000")));
        let published = channel.published.borrow();
        assert_eq!(published[0].0, "user");
        assert_eq!(published[0].1, json!({"name": "Ada", "color": "#ff0000"}));
    }

    #[test]
    fn test_selection_published_as_cursor() {
        let channel = Rc::new(Recorded::default());
        let layer = CursorLayer::new(channel.clone(), None);
        layer.set_selection(Selection { anchor: 2, head: 5 });
        let published = channel.published.borrow();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1, json!({"anchor": 2, "head": 5}));
    }

    #[test]
    fn test_remote_cursors_skip_peers_without_selection() {
        let channel = Rc::new(Recorded {
            peers: vec![
                (
                    3,
                    json!({"user": {"name": "B", "color": "#00ff00"}, "cursor": {"anchor": 1, "head": 1}}),
                ),
                (2, json!({"user": {"name": "C", "color": "#0000ff"}})),
                (1, json!({"cursor": {"anchor": 0, "head": 4}})),
            ],
            ..Default::default()
        });
        let layer = CursorLayer::new(channel, None);
        let cursors = layer.remote_cursors();
        assert_eq!(cursors.len(), 2);
        assert_eq!(cursors[0].client_id, 1);
        assert_eq!(cursors[0].user, None);
        assert_eq!(cursors[1].user.as_ref().unwrap().name, "B");
    }

    #[test]
    fn test_relative_position_cursor_is_skipped() {
        let relative = json!({
            "anchor": {"type": {"client": 7, "clock": 0}, "tname": null, "item": {"client": 7, "clock": 3}, "assoc": 0},
            "head": {"type": {"client": 7, "clock": 0}, "tname": null, "item": {"client": 7, "clock": 5}, "assoc": 0}
        });
        let channel = Rc::new(Recorded {
            peers: vec![(7, json!({"user": {"name": "JS", "color": "#123456"}, "cursor": relative}))],
            ..Default::default()
        });
        let layer = CursorLayer::new(channel, None);
        assert!(layer.remote_cursors().is_empty());
    }
}
