//! Storage node abstraction
//!
//! The gateway only needs four operations from the node that actually
//! holds the data: a liveness probe, its identity, recursive reference
//! enumeration, and pin-by-hash.

mod ipfs;

pub use ipfs::IpfsClient;

use crate::error::GexpinResult;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

/// Stream of reference hashes, in the order the node reports them
pub type RefStream = BoxStream<'static, GexpinResult<String>>;

/// Content-addressed storage node
#[async_trait]
pub trait StorageNode: Send + Sync {
    /// Whether the node answers at all
    async fn is_up(&self) -> bool;

    /// The node's peer id
    async fn id(&self) -> GexpinResult<String>;

    /// Every hash reachable from `hash`, fetching content as it goes.
    ///
    /// Errors that occur while the stream is being consumed are yielded
    /// as items; the stream ends after the first error.
    async fn refs(&self, hash: &str) -> GexpinResult<RefStream>;

    /// Pin `hash` recursively
    async fn pin(&self, hash: &str) -> GexpinResult<()>;
}
