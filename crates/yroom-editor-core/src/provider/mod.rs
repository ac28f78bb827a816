//! Collaboration providers.
//!
//! A provider connects one [`CollabDoc`] and one [`Awareness`] to a room
//! server. It runs the sync handshake, forwards local updates, merges remote
//! ones and relays presence. Both backends share this state machine and
//! differ only in their [`Framing`].
//!
//! There is no reconnect: once the connection is gone the provider stays
//! `Disconnected` until the session is torn down.

mod hocuspocus;
mod websocket;

pub use hocuspocus::HocuspocusFraming;
pub use websocket::YWebsocketFraming;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;
use yrs::Subscription;

use crate::awareness::{Awareness, AwarenessChange};
use crate::connection::ConnectionTarget;
use crate::doc::CollabDoc;
use crate::error::{EditorError, ProtocolError};
use crate::platform::{ConnectionEvents, Connector, Transport};
use crate::protocol::SyncMessage;

/// y-websocket provider used by the ProseMirror integration.
pub type WebsocketProvider = Provider<YWebsocketFraming>;

/// Hocuspocus provider used by the TipTap integration.
pub type HocuspocusProvider = Provider<HocuspocusFraming>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

/// Messages a provider sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Sync(SyncMessage),
    Awareness(Vec<u8>),
    QueryAwareness,
    Token(String),
}

/// Messages a provider reacts to, after framing is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Sync(SyncMessage),
    Awareness(Vec<u8>),
    QueryAwareness,
    Denied(String),
    Authenticated(String),
    Stateless(String),
    SyncStatus(bool),
    Closed(Option<String>),
    /// Addressed to another document on the same socket.
    Ignored,
}

/// How a backend wraps provider messages into frames.
pub trait Framing: 'static {
    fn encode(&self, message: Outbound) -> Vec<u8>;

    fn decode(&self, frame: &[u8]) -> Result<Inbound, ProtocolError>;

    /// Sent right after the socket opens, before sync starts.
    fn handshake(&self) -> Vec<Outbound> {
        Vec::new()
    }
}

type StatusListener = Rc<dyn Fn(ConnectionStatus)>;
type AwarenessListener = Rc<dyn Fn(&AwarenessChange)>;

struct ProviderInner<F: Framing> {
    framing: F,
    doc: CollabDoc,
    awareness: RefCell<Awareness>,
    transport: RefCell<Option<Rc<dyn Transport>>>,
    status: Cell<ConnectionStatus>,
    synced: Cell<bool>,
    status_listeners: RefCell<Vec<StatusListener>>,
    awareness_listeners: RefCell<Vec<AwarenessListener>>,
    update_sub: RefCell<Option<Subscription>>,
}

/// A live connection between a document and its room.
pub struct Provider<F: Framing> {
    inner: Rc<ProviderInner<F>>,
}

impl<F: Framing> Clone for Provider<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: Framing> Provider<F> {
    /// Start connecting `doc` to `target`.
    ///
    /// Returns once the connection attempt is under way; the status moves to
    /// `Connected` when the platform reports the socket open.
    pub fn connect(
        connector: &dyn Connector,
        target: &ConnectionTarget,
        doc: CollabDoc,
        framing: F,
    ) -> Result<Self, EditorError> {
        let awareness = Awareness::new(doc.client_id());
        let inner = Rc::new(ProviderInner {
            framing,
            doc,
            awareness: RefCell::new(awareness),
            transport: RefCell::new(None),
            status: Cell::new(ConnectionStatus::Connecting),
            synced: Cell::new(false),
            status_listeners: RefCell::new(Vec::new()),
            awareness_listeners: RefCell::new(Vec::new()),
            update_sub: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let sub = inner.doc.observe_updates(move |_, update, remote| {
            if remote {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                inner.send(Outbound::Sync(SyncMessage::Update(update.to_vec())));
            }
        })?;
        *inner.update_sub.borrow_mut() = Some(sub);

        tracing::debug!(%target, "connecting");
        let events: Rc<dyn ConnectionEvents> = Rc::new(EventSink {
            inner: Rc::downgrade(&inner),
        });
        let transport = connector.connect(target, events)?;
        *inner.transport.borrow_mut() = Some(transport);

        Ok(Self { inner })
    }

    pub fn doc(&self) -> &CollabDoc {
        &self.inner.doc
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.get()
    }

    /// Whether the initial handshake completed.
    pub fn is_synced(&self) -> bool {
        self.inner.synced.get()
    }

    pub fn client_id(&self) -> u64 {
        self.inner.doc.client_id()
    }

    /// Register a callback for status changes.
    pub fn on_status(&self, f: impl Fn(ConnectionStatus) + 'static) {
        self.inner.status_listeners.borrow_mut().push(Rc::new(f));
    }

    /// Register a callback for remote presence changes.
    pub fn on_awareness_change(&self, f: impl Fn(&AwarenessChange) + 'static) {
        self.inner.awareness_listeners.borrow_mut().push(Rc::new(f));
    }

    /// Set one field of the local presence and broadcast it.
    pub fn set_awareness_field(&self, key: &str, value: Value) {
        let update = {
            let mut awareness = self.inner.awareness.borrow_mut();
            awareness.set_local_field(key, value);
            awareness.encode_local_update()
        };
        self.inner.send(Outbound::Awareness(update));
    }

    /// Read access to the merged presence of everyone in the room.
    pub fn with_awareness<R>(&self, f: impl FnOnce(&Awareness) -> R) -> R {
        f(&self.inner.awareness.borrow())
    }

    /// Advance the presence clock to `now_ms`.
    ///
    /// Re-broadcasts our state when it is due and drops peers that went
    /// quiet. The platform calls this every few seconds.
    pub fn tick(&self, now_ms: f64) {
        let (renewal, removed) = {
            let mut awareness = self.inner.awareness.borrow_mut();
            awareness.set_time(now_ms);
            (awareness.renew_if_due(), awareness.expire_peers())
        };
        if let Some(update) = renewal {
            tracing::trace!("renewing presence");
            self.inner.send(Outbound::Awareness(update));
        }
        if !removed.is_empty() {
            tracing::debug!(peers = ?removed, "presence timed out");
        }
        self.inner.notify_awareness(&AwarenessChange {
            removed,
            ..Default::default()
        });
    }

    /// Announce departure, close the connection and stop forwarding updates.
    /// Safe to call repeatedly.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        if inner.status.get() == ConnectionStatus::Connected {
            let update = {
                let mut awareness = inner.awareness.borrow_mut();
                awareness.set_local_state(None);
                awareness.encode_local_update()
            };
            inner.send(Outbound::Awareness(update));
        }
        inner.update_sub.borrow_mut().take();
        inner.drop_connection();
    }
}

impl<F: Framing> ProviderInner<F> {
    fn send(&self, message: Outbound) {
        if self.status.get() != ConnectionStatus::Connected {
            tracing::trace!(?message, "not connected, dropping");
            return;
        }
        let transport = self.transport.borrow().clone();
        let Some(transport) = transport else {
            return;
        };
        let frame = self.framing.encode(message);
        if let Err(e) = transport.send(&frame) {
            tracing::warn!(error = %e, "send failed");
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        if self.status.replace(status) == status {
            return;
        }
        tracing::debug!(status = status.as_str(), "provider status");
        let listeners = self.status_listeners.borrow().clone();
        for listener in listeners {
            listener(status);
        }
    }

    fn notify_awareness(&self, change: &AwarenessChange) {
        if change.is_empty() {
            return;
        }
        let listeners = self.awareness_listeners.borrow().clone();
        for listener in listeners {
            listener(change);
        }
    }

    fn drop_connection(&self) {
        let transport = self.transport.borrow_mut().take();
        if let Some(transport) = transport {
            transport.close();
        }
        self.synced.set(false);
        let removed = self.awareness.borrow_mut().clear_peers();
        self.set_status(ConnectionStatus::Disconnected);
        self.notify_awareness(&AwarenessChange {
            removed,
            ..Default::default()
        });
    }

    fn handle_open(&self) {
        if self.transport.borrow().is_none() {
            return;
        }
        self.set_status(ConnectionStatus::Connected);
        for message in self.framing.handshake() {
            self.send(message);
        }
        self.send(Outbound::Sync(SyncMessage::Step1(self.doc.state_vector())));
        let local = {
            let awareness = self.awareness.borrow();
            awareness
                .local_state()
                .map(|_| awareness.encode_local_update())
        };
        if let Some(update) = local {
            self.send(Outbound::Awareness(update));
        }
    }

    fn handle_frame(&self, frame: &[u8]) -> Result<(), ProtocolError> {
        match self.framing.decode(frame)? {
            Inbound::Sync(SyncMessage::Step1(sv)) => {
                let diff = self.doc.encode_diff(&sv)?;
                self.send(Outbound::Sync(SyncMessage::Step2(diff)));
            }
            Inbound::Sync(SyncMessage::Step2(update)) => {
                self.doc.apply_remote_update(&update)?;
                if !self.synced.replace(true) {
                    tracing::debug!("synced");
                }
            }
            Inbound::Sync(SyncMessage::Update(update)) => {
                self.doc.apply_remote_update(&update)?;
            }
            Inbound::Awareness(update) => {
                let change = self.awareness.borrow_mut().apply_update(&update)?;
                self.notify_awareness(&change);
            }
            Inbound::QueryAwareness => {
                let update = self.awareness.borrow().encode_local_update();
                self.send(Outbound::Awareness(update));
            }
            Inbound::Denied(reason) => {
                tracing::warn!(%reason, "permission denied");
                self.drop_connection();
            }
            Inbound::Closed(reason) => {
                tracing::warn!(reason = reason.as_deref(), "server closed the document");
                self.drop_connection();
            }
            Inbound::Authenticated(scope) => tracing::debug!(%scope, "authenticated"),
            Inbound::Stateless(payload) => tracing::debug!(%payload, "stateless message"),
            Inbound::SyncStatus(saved) => tracing::trace!(saved, "sync status"),
            Inbound::Ignored => tracing::trace!("frame for another document"),
        }
        Ok(())
    }
}

/// Routes platform callbacks to a provider without keeping it alive.
struct EventSink<F: Framing> {
    inner: Weak<ProviderInner<F>>,
}

impl<F: Framing> ConnectionEvents for EventSink<F> {
    fn on_open(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.handle_open();
        }
    }

    fn on_frame(&self, frame: &[u8]) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        // late frames after disconnect
        if inner.transport.borrow().is_none() {
            return;
        }
        tracing::trace!(len = frame.len(), "frame");
        if let Err(e) = inner.handle_frame(frame) {
            tracing::warn!(error = %e, "dropping malformed frame");
        }
    }

    fn on_close(&self, reason: Option<&str>) {
        if let Some(inner) = self.inner.upgrade() {
            if inner.transport.borrow().is_some() {
                tracing::info!(reason, "connection closed");
                inner.drop_connection();
            }
        }
    }
}
