//! Ephemeral presence state shared among the participants of a room.
//!
//! Wire compatible with the y-protocols awareness encoding: a count followed
//! by `(clientId, clock, json)` triples, where `"null"` marks a client that
//! left. States are never persisted.
//!
//! Time is supplied by the caller through [`Awareness::set_time`], in
//! milliseconds. A participant re-sends its state every
//! [`RENEW_INTERVAL_MS`] and peers silent for [`OUTDATED_TIMEOUT_MS`] are
//! dropped, matching the y-protocols timings.

use std::collections::HashMap;

use serde_json::{Map, Value};
use yrs::encoding::read::{Cursor, Read};
use yrs::encoding::write::Write;

use crate::error::ProtocolError;

/// CRDT client id of a participant.
pub type ClientId = u64;

/// Peers not heard from for this long are considered gone.
pub const OUTDATED_TIMEOUT_MS: f64 = 30_000.0;

/// The local state is re-sent once it is this old.
pub const RENEW_INTERVAL_MS: f64 = OUTDATED_TIMEOUT_MS / 2.0;

/// Last known state of a remote participant.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerState {
    pub clock: u32,
    pub state: Value,
    /// When the last accepted update arrived.
    pub last_seen: f64,
}

/// Which peers changed as a result of applying an update.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AwarenessChange {
    pub added: Vec<ClientId>,
    pub updated: Vec<ClientId>,
    pub removed: Vec<ClientId>,
}

impl AwarenessChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Local presence plus everything heard from peers.
#[derive(Debug, Clone)]
pub struct Awareness {
    client_id: ClientId,
    clock: u32,
    local: Option<Value>,
    local_updated: f64,
    peers: HashMap<ClientId, PeerState>,
    /// Clock and departure time of peers that left, so late duplicates don't
    /// resurrect them. Forgotten after [`OUTDATED_TIMEOUT_MS`].
    departed: HashMap<ClientId, (u32, f64)>,
    now: Option<f64>,
}

impl Awareness {
    /// Start with an empty object as local state, as y-websocket does.
    pub fn new(client_id: ClientId) -> Self {
        Self {
            client_id,
            clock: 0,
            local: Some(Value::Object(Map::new())),
            local_updated: 0.0,
            peers: HashMap::new(),
            departed: HashMap::new(),
            now: None,
        }
    }

    fn now(&self) -> f64 {
        self.now.unwrap_or(0.0)
    }

    /// Move the clock to `now_ms`. The clock never runs backwards.
    ///
    /// Until the first call, time stands at zero; the first reading shifts
    /// every stamp taken so far onto the real clock.
    pub fn set_time(&mut self, now_ms: f64) {
        match self.now {
            None => {
                self.local_updated += now_ms;
                for peer in self.peers.values_mut() {
                    peer.last_seen += now_ms;
                }
                for (_, at) in self.departed.values_mut() {
                    *at += now_ms;
                }
                self.now = Some(now_ms);
            }
            Some(prev) => self.now = Some(prev.max(now_ms)),
        }
    }

    /// Bump the clock on an unchanged local state once it is due, returning
    /// the update to broadcast. Nothing is due after we left.
    pub fn renew_if_due(&mut self) -> Option<Vec<u8>> {
        if self.local.is_none() || self.now() - self.local_updated < RENEW_INTERVAL_MS {
            return None;
        }
        let state = self.local.take();
        self.set_local_state(state);
        Some(self.encode_local_update())
    }

    /// Drop peers that have gone quiet and forget old departures.
    pub fn expire_peers(&mut self) -> Vec<ClientId> {
        let now = self.now();
        let mut expired: Vec<_> = self
            .peers
            .iter()
            .filter(|(_, peer)| now - peer.last_seen >= OUTDATED_TIMEOUT_MS)
            .map(|(id, _)| *id)
            .collect();
        expired.sort_unstable();
        for id in &expired {
            if let Some(peer) = self.peers.remove(id) {
                self.departed.insert(*id, (peer.clock, now));
            }
        }
        self.departed
            .retain(|_, (_, at)| now - *at < OUTDATED_TIMEOUT_MS);
        expired
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    pub fn local_state(&self) -> Option<&Value> {
        self.local.as_ref()
    }

    /// Replace the local state. `None` announces that we left.
    pub fn set_local_state(&mut self, state: Option<Value>) {
        self.clock += 1;
        self.local = state;
        self.local_updated = self.now();
    }

    /// Set one top-level field of the local state, keeping the others.
    pub fn set_local_field(&mut self, key: &str, value: Value) {
        let mut state = match self.local.take() {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        state.insert(key.to_string(), value);
        self.set_local_state(Some(Value::Object(state)));
    }

    /// Remote participants with a live state.
    pub fn peers(&self) -> impl Iterator<Item = (ClientId, &Value)> {
        self.peers.iter().map(|(id, peer)| (*id, &peer.state))
    }

    pub fn peer(&self, client_id: ClientId) -> Option<&PeerState> {
        self.peers.get(&client_id)
    }

    /// Forget every remote participant, e.g. after the connection dropped.
    pub fn clear_peers(&mut self) -> Vec<ClientId> {
        let now = self.now();
        let removed: Vec<_> = self.peers.keys().copied().collect();
        for (id, peer) in self.peers.drain() {
            self.departed.insert(id, (peer.clock, now));
        }
        removed
    }

    /// Encode the local state as an awareness update.
    pub fn encode_local_update(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.write_var(1u32);
        write_entry(&mut buf, self.client_id, self.clock, self.local.as_ref());
        buf
    }

    /// Encode the given clients (local and/or remote) as one update.
    /// Unknown clients are skipped.
    pub fn encode_update(&self, clients: &[ClientId]) -> Vec<u8> {
        let mut entries = Vec::with_capacity(clients.len());
        for id in clients {
            if *id == self.client_id {
                entries.push((*id, self.clock, self.local.as_ref()));
            } else if let Some(peer) = self.peers.get(id) {
                entries.push((*id, peer.clock, Some(&peer.state)));
            }
        }
        let mut buf = Vec::new();
        buf.write_var(entries.len() as u32);
        for (id, clock, state) in entries {
            write_entry(&mut buf, id, clock, state);
        }
        buf
    }

    /// Merge an update received from the network.
    ///
    /// Entries about our own client id are ignored; the local state is only
    /// changed through the setters.
    pub fn apply_update(&mut self, update: &[u8]) -> Result<AwarenessChange, ProtocolError> {
        let now = self.now();
        let mut cursor = Cursor::new(update);
        let len: u32 = cursor.read_var()?;
        let mut change = AwarenessChange::default();

        for _ in 0..len {
            let client_id: u64 = cursor.read_var()?;
            let clock: u32 = cursor.read_var()?;
            let json = cursor.read_string()?;
            let state: Value = serde_json::from_str(json).map_err(ProtocolError::Awareness)?;

            if client_id == self.client_id {
                continue;
            }

            let known_clock = self
                .peers
                .get(&client_id)
                .map(|p| p.clock)
                .or_else(|| self.departed.get(&client_id).map(|(clock, _)| *clock));

            if state.is_null() {
                let current = self.peers.get(&client_id).map(|p| p.clock);
                if let Some(current) = current.filter(|c| *c <= clock) {
                    self.peers.remove(&client_id);
                    self.departed.insert(client_id, (current.max(clock), now));
                    change.removed.push(client_id);
                }
                continue;
            }

            match known_clock {
                Some(known) if known >= clock => {}
                _ => {
                    self.departed.remove(&client_id);
                    let changed = self.peers.get(&client_id).map(|prev| prev.state != state);
                    self.peers.insert(
                        client_id,
                        PeerState {
                            clock,
                            state,
                            last_seen: now,
                        },
                    );
                    match changed {
                        None => change.added.push(client_id),
                        Some(true) => change.updated.push(client_id),
                        Some(false) => {}
                    }
                }
            }
        }

        Ok(change)
    }
}

fn write_entry(buf: &mut Vec<u8>, client_id: ClientId, clock: u32, state: Option<&Value>) {
    buf.write_var(client_id);
    buf.write_var(clock);
    match state {
        Some(state) => buf.write_string(&state.to_string()),
        None => buf.write_string("null"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_local_update_reaches_peer() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        alice.set_local_field("user", json!({"name": "Alice", "color": "#ff0000"}));

        let change = bob.apply_update(&alice.encode_local_update()).unwrap();
        assert_eq!(change.added, vec![1]);
        let (_, state) = bob.peers().next().unwrap();
        assert_eq!(state["user"]["name"], "Alice");
    }

    #[test]
    fn test_field_updates_merge_into_object() {
        let mut a = Awareness::new(1);
        a.set_local_field("user", json!({"name": "A"}));
        a.set_local_field("cursor", json!({"anchor": 1, "head": 3}));
        let state = a.local_state().unwrap();
        assert_eq!(state["user"]["name"], "A");
        assert_eq!(state["cursor"]["head"], 3);
    }

    #[test]
    fn test_null_state_removes_peer() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        bob.apply_update(&alice.encode_local_update()).unwrap();

        alice.set_local_state(None);
        let change = bob.apply_update(&alice.encode_local_update()).unwrap();
        assert_eq!(change.removed, vec![1]);
        assert_eq!(bob.peers().count(), 0);
    }

    #[test]
    fn test_stale_update_ignored() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        alice.set_local_field("n", json!(1));
        let old = alice.encode_local_update();
        alice.set_local_field("n", json!(2));
        bob.apply_update(&alice.encode_local_update()).unwrap();

        let change = bob.apply_update(&old).unwrap();
        assert!(change.is_empty());
        assert_eq!(bob.peer(1).unwrap().state["n"], 2);
    }

    #[test]
    fn test_departed_peer_not_resurrected_by_duplicate() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        let hello = alice.encode_local_update();
        bob.apply_update(&hello).unwrap();
        alice.set_local_state(None);
        bob.apply_update(&alice.encode_local_update()).unwrap();

        let change = bob.apply_update(&hello).unwrap();
        assert!(change.is_empty());
    }

    #[test]
    fn test_own_client_entries_ignored() {
        let mut a = Awareness::new(7);
        let mut echo = Awareness::new(7);
        echo.set_local_field("x", json!(true));
        let change = a.apply_update(&echo.encode_local_update()).unwrap();
        assert!(change.is_empty());
        assert_eq!(a.peers().count(), 0);
    }

    #[test]
    fn test_encode_update_for_mixed_clients() {
        let alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        bob.apply_update(&alice.encode_local_update()).unwrap();

        let relayed = bob.encode_update(&[1, 2, 99]);
        let mut carol = Awareness::new(3);
        let change = carol.apply_update(&relayed).unwrap();
        assert_eq!(change.added.len(), 2);
    }

    #[test]
    fn test_renewal_due_after_interval() {
        let mut a = Awareness::new(1);
        a.set_time(1_000.0);
        a.set_local_field("user", json!({"name": "A"}));

        a.set_time(1_000.0 + RENEW_INTERVAL_MS - 1.0);
        assert!(a.renew_if_due().is_none());

        a.set_time(1_000.0 + RENEW_INTERVAL_MS);
        let renewal = a.renew_if_due().unwrap();
        let mut b = Awareness::new(2);
        b.apply_update(&renewal).unwrap();
        assert_eq!(b.peer(1).unwrap().clock, 2);
        assert_eq!(b.peer(1).unwrap().state["user"]["name"], "A");

        // just renewed
        assert!(a.renew_if_due().is_none());
    }

    #[test]
    fn test_no_renewal_after_leaving() {
        let mut a = Awareness::new(1);
        a.set_time(0.0);
        a.set_local_state(None);
        a.set_time(OUTDATED_TIMEOUT_MS * 2.0);
        assert!(a.renew_if_due().is_none());
    }

    #[test]
    fn test_silent_peer_expires() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        bob.set_time(10_000.0);
        bob.apply_update(&alice.encode_local_update()).unwrap();

        bob.set_time(10_000.0 + OUTDATED_TIMEOUT_MS - 1.0);
        assert!(bob.expire_peers().is_empty());

        bob.set_time(10_000.0 + OUTDATED_TIMEOUT_MS);
        assert_eq!(bob.expire_peers(), vec![1]);
        assert_eq!(bob.peers().count(), 0);

        // a later renewal brings the peer back
        let state = alice.local_state().cloned();
        alice.set_local_state(state);
        let change = bob.apply_update(&alice.encode_local_update()).unwrap();
        assert_eq!(change.added, vec![1]);
    }

    #[test]
    fn test_renewal_keeps_peer_alive() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        alice.set_time(0.0);
        bob.set_time(0.0);
        bob.apply_update(&alice.encode_local_update()).unwrap();

        let mut now = 0.0;
        while now < OUTDATED_TIMEOUT_MS * 3.0 {
            now += 3_000.0;
            alice.set_time(now);
            bob.set_time(now);
            if let Some(update) = alice.renew_if_due() {
                let change = bob.apply_update(&update).unwrap();
                assert!(change.is_empty());
            }
            assert!(bob.expire_peers().is_empty());
        }
        assert!(bob.peer(1).is_some());
    }

    #[test]
    fn test_first_reading_rebases_stamps() {
        let alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        bob.apply_update(&alice.encode_local_update()).unwrap();

        bob.set_time(1_700_000_000_000.0);
        assert!(bob.expire_peers().is_empty());
        assert!(bob.renew_if_due().is_none());
    }

    #[test]
    fn test_departures_are_forgotten() {
        let mut alice = Awareness::new(1);
        let mut bob = Awareness::new(2);
        bob.set_time(0.0);
        bob.apply_update(&alice.encode_local_update()).unwrap();
        alice.set_local_state(None);
        bob.apply_update(&alice.encode_local_update()).unwrap();
        assert_eq!(bob.departed.len(), 1);

        bob.set_time(OUTDATED_TIMEOUT_MS - 1.0);
        bob.expire_peers();
        assert_eq!(bob.departed.len(), 1);

        bob.set_time(OUTDATED_TIMEOUT_MS);
        bob.expire_peers();
        assert!(bob.departed.is_empty());
    }

    #[test]
    fn test_truncated_update_is_an_error() {
        let a = Awareness::new(1);
        let bytes = a.encode_local_update();
        let mut b = Awareness::new(2);
        assert!(b.apply_update(&bytes[..bytes.len() - 1]).is_err());
    }
}
