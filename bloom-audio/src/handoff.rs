//! Lock-free single-slot handoff of compiled sequences.
//!
//! The edit side publishes whole snapshots; the playback side polls at step
//! boundaries and adopts a newer one by cloning its `Arc`. The playback side
//! never frees a snapshot: it sends the one it retires back over the garbage
//! channel and the edit side drops it there.

use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use crossbeam_channel::{Sender, TrySendError};

use crate::sequencer_tick::NodeDriver;
use crate::snapshot::CompiledSequence;

#[derive(Debug)]
pub struct SnapshotSlot {
    current: ArcSwap<CompiledSequence>,
}

impl SnapshotSlot {
    pub fn new(initial: CompiledSequence) -> Self {
        Self { current: ArcSwap::from_pointee(initial) }
    }

    /// Replace the published snapshot. Returns the one it displaced.
    pub fn publish(&self, snapshot: CompiledSequence) -> Arc<CompiledSequence> {
        self.current.swap(Arc::new(snapshot))
    }

    pub fn load(&self) -> Arc<CompiledSequence> {
        self.current.load_full()
    }

    pub fn version(&self) -> u64 {
        self.current.load().version
    }

    /// The published snapshot, if its version is above `version`.
    pub fn load_if_newer(&self, version: u64) -> Option<Arc<CompiledSequence>> {
        let guard = self.current.load();
        if guard.version > version {
            Some(Guard::into_inner(guard))
        } else {
            None
        }
    }
}

/// Playback-side allocations handed back to the edit side to be freed.
#[derive(Debug)]
pub enum Retired {
    Snapshot(Arc<CompiledSequence>),
    /// A removed node's driver, with its snapshot, slot and monitor
    Driver(Box<NodeDriver>),
}

/// Send `item` back over the garbage channel.
///
/// When the channel is full the item is returned so the caller can keep it
/// alive until a later retry.
pub(crate) fn retire(tx: &Sender<Retired>, item: Retired) -> Result<(), Retired> {
    match tx.try_send(item) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(item)) | Err(TrySendError::Disconnected(item)) => Err(item),
    }
}
