//! Shared CRDT document.
//!
//! Thin wrapper over a [`yrs::Doc`]. The document is created empty on every
//! session start and filled by the sync handshake; nothing is persisted
//! client-side.

use yrs::types::xml::XmlFragmentRef;
use yrs::updates::decoder::Decode;
use yrs::updates::encoder::Encode;
use yrs::{
    Doc, GetString, Origin, ReadTxn, StateVector, Subscription, Transact, TransactionMut, Update,
};

use crate::error::{EditorError, ProtocolError};

/// Transaction origin for changes that arrived from the network.
///
/// Updates carrying this origin are never echoed back to the server and
/// never enter the local undo history.
pub const PROVIDER_ORIGIN: &str = "yroom-provider";

/// Transaction origin for edits made through this client's editor. Only
/// these are tracked for undo.
pub const LOCAL_ORIGIN: &str = "yroom-local";

/// The document shared by every participant of a room.
#[derive(Clone, Default)]
pub struct CollabDoc {
    doc: Doc,
}

impl CollabDoc {
    pub fn new() -> Self {
        Self { doc: Doc::new() }
    }

    /// Fixed client id, for reproducible tests.
    pub fn with_client_id(client_id: u64) -> Self {
        Self {
            doc: Doc::with_client_id(client_id),
        }
    }

    pub fn inner(&self) -> &Doc {
        &self.doc
    }

    pub fn client_id(&self) -> u64 {
        self.doc.client_id()
    }

    /// The named XML fragment editors bind to, created on first use.
    pub fn fragment(&self, name: &str) -> XmlFragmentRef {
        self.doc.get_or_insert_xml_fragment(name)
    }

    /// Serialized XML of a fragment.
    pub fn fragment_xml(&self, fragment: &XmlFragmentRef) -> String {
        let txn = self.doc.transact();
        fragment.get_string(&txn)
    }

    /// v1-encoded state vector.
    pub fn state_vector(&self) -> Vec<u8> {
        self.doc.transact().state_vector().encode_v1()
    }

    /// Everything this replica has that `remote_sv` lacks.
    pub fn encode_diff(&self, remote_sv: &[u8]) -> Result<Vec<u8>, ProtocolError> {
        let sv = StateVector::decode_v1(remote_sv)
            .map_err(|e| ProtocolError::Update(e.to_string()))?;
        Ok(self.doc.transact().encode_state_as_update_v1(&sv))
    }

    /// Full document state as one update.
    pub fn encode_state(&self) -> Vec<u8> {
        self.doc
            .transact()
            .encode_state_as_update_v1(&StateVector::default())
    }

    /// Integrate an update received from a peer, tagged with
    /// [`PROVIDER_ORIGIN`].
    pub fn apply_remote_update(&self, update: &[u8]) -> Result<(), ProtocolError> {
        let update =
            Update::decode_v1(update).map_err(|e| ProtocolError::Update(e.to_string()))?;
        let mut txn = self.doc.transact_mut_with(PROVIDER_ORIGIN);
        txn.apply_update(update)
            .map_err(|e| ProtocolError::Update(e.to_string()))
    }

    /// Run a local edit, tagged with [`LOCAL_ORIGIN`].
    pub fn transact<R>(&self, f: impl FnOnce(&mut TransactionMut<'_>) -> R) -> R {
        let mut txn = self.doc.transact_mut_with(LOCAL_ORIGIN);
        f(&mut txn)
    }

    /// Called after every committed transaction with the encoded update and
    /// whether it came from the network.
    ///
    /// The callback runs while the transaction is committing; it must not
    /// open another transaction on this document.
    pub fn observe_updates<F>(&self, f: F) -> Result<Subscription, EditorError>
    where
        F: Fn(&TransactionMut<'_>, &[u8], bool) + 'static,
    {
        let remote_origin = Origin::from(PROVIDER_ORIGIN);
        self.doc
            .observe_update_v1(move |txn, event| {
                let remote = txn.origin() == Some(&remote_origin);
                f(txn, &event.update, remote);
            })
            .map_err(|e| EditorError::Document(e.to_string()))
    }
}

impl std::fmt::Debug for CollabDoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollabDoc")
            .field("client_id", &self.client_id())
            .finish()
    }
}
