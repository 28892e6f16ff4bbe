//! Participants: one EL/CL node pair each, launched in order and never removed.

use std::sync::Arc;

use crate::{
    cl::ClClientContext,
    client::{ClClientType, ElClientType},
    el::ElClientContext,
};

mod network;
pub use network::{ClLaunchers, ElLaunchers, ParticipantNetwork};

/// How a launching node relates to the network's bootstrap node.
///
/// The first node of the network is the bootstrap and peers with nobody. Every later
/// node peers with the bootstrap's context only, forming a star.
#[derive(Debug)]
pub enum BootstrapRole<'a, C> {
    /// This node anchors the network.
    Bootstrap,
    /// This node peers with the given bootstrap node.
    Peer(&'a C),
}

impl<C> Clone for BootstrapRole<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for BootstrapRole<'_, C> {}

impl<'a, C> BootstrapRole<'a, C> {
    /// Picks [`Self::Bootstrap`] when there is no bootstrap node yet.
    pub const fn from_bootstrap(bootstrap: Option<&'a C>) -> Self {
        match bootstrap {
            Some(context) => Self::Peer(context),
            None => Self::Bootstrap,
        }
    }

    /// Whether the launching node is the bootstrap.
    pub const fn is_bootstrap(&self) -> bool {
        matches!(self, Self::Bootstrap)
    }

    /// The bootstrap node's context, for peers.
    pub const fn peer(&self) -> Option<&'a C> {
        match *self {
            Self::Bootstrap => None,
            Self::Peer(context) => Some(context),
        }
    }
}

/// A launched and healthy EL/CL node pair.
#[derive(Debug, Clone)]
pub struct Participant {
    /// Launch position. Ordinal 0 is the bootstrap.
    pub ordinal: usize,
    /// Execution client kind.
    pub el_client_type: ElClientType,
    /// Consensus client kind.
    pub cl_client_type: ClClientType,
    /// Execution client.
    pub el: Arc<ElClientContext>,
    /// Consensus client.
    pub cl: Arc<ClClientContext>,
}

impl Participant {
    /// Whether this participant anchors the network.
    pub const fn is_bootstrap(&self) -> bool {
        self.ordinal == 0
    }
}
