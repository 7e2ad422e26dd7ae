//! Remote persistence collaborator
//!
//! Replication is advisory: the store has already committed by the time a
//! mutation reaches any of these.

pub mod journal;

use futures::future::{self, BoxFuture};

use crate::state::StoreEvent;

pub use journal::{JournalEntry, JournalSync};

/// Replicates committed mutations somewhere else. Events arrive one at a
/// time in commit order; the next is not sent until this future resolves.
pub trait RemoteSync: Send + Sync + 'static {
    fn replicate(&self, event: StoreEvent) -> BoxFuture<'static, anyhow::Result<()>>;
}

/// Accepts everything, stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSync;

impl RemoteSync for NoopSync {
    fn replicate(&self, _event: StoreEvent) -> BoxFuture<'static, anyhow::Result<()>> {
        Box::pin(future::ready(Ok(())))
    }
}
