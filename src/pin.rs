//! The pin workflow
//!
//! validate → resolve → (stream) enumerate refs → pin → log → record.
//!
//! Steps run strictly in order. The storage node pin happens before the
//! log write, which happens before the cache update; nothing is undone
//! when a later step fails.

use crate::audit::AuditLog;
use crate::error::{GexpinError, GexpinResult};
use crate::package::{normalize_github_url, PackageRecord};
use crate::recent::RecentPins;
use crate::resolver::{Resolved, VersionResolver};
use crate::storage::StorageNode;
use futures_util::StreamExt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

/// Progress events are buffered up to this many before the run waits on the reader
const EVENT_BUFFER: usize = 64;

/// Progress of a single pin run, in the order it happens
#[derive(Debug)]
pub enum PinEvent {
    /// Resolution succeeded; the slow part is about to start
    Started {
        source: String,
        version: String,
        hash: String,
    },
    /// The node accepted the refs request
    RefsStarted,
    /// One reachable hash, fetched by the node
    Ref(String),
    /// Every reference has been fetched; pinning next
    RefsDone,
    /// Pinned, logged and recorded
    Completed(PackageRecord),
    /// The run stopped at this error; nothing follows
    Failed(GexpinError),
}

/// A validated and resolved pin request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinJob {
    /// Normalized `owner/repo`
    pub source: String,
    pub resolved: Resolved,
}

/// Optional bounds on the calls made to external services
#[derive(Debug, Clone, Copy, Default)]
pub struct PinTimeouts {
    /// Bounds reference enumeration
    pub fetch: Option<Duration>,
    /// Bounds the pin call
    pub pin: Option<Duration>,
}

/// Runs pin requests against a storage node and records the results
pub struct PinService {
    resolver: VersionResolver,
    storage: Arc<dyn StorageNode>,
    audit: AuditLog,
    recent: RecentPins,
    timeouts: PinTimeouts,
}

impl PinService {
    pub fn new(
        resolver: VersionResolver,
        storage: Arc<dyn StorageNode>,
        audit: AuditLog,
        timeouts: PinTimeouts,
    ) -> Self {
        Self {
            resolver,
            storage,
            audit,
            recent: RecentPins::new(),
            timeouts,
        }
    }

    pub fn recent(&self) -> &RecentPins {
        &self.recent
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Validate the submitted url and resolve its published version.
    ///
    /// Nothing is written anywhere if this fails.
    pub async fn prepare(&self, raw_url: &str) -> GexpinResult<PinJob> {
        let source = normalize_github_url(raw_url)?;
        let resolved = self.resolver.resolve(&source).await?;
        debug!(
            "Resolved {} to version {} ({})",
            source, resolved.version, resolved.hash
        );
        Ok(PinJob { source, resolved })
    }

    /// Start the slow part of the workflow in its own task.
    ///
    /// The run does not depend on anyone reading the returned channel: if
    /// the receiver is dropped the run still pins, logs and records.
    pub fn spawn(self: &Arc<Self>, job: PinJob) -> mpsc::Receiver<PinEvent> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let service = Arc::clone(self);
        let span = info_span!("pin", run_id = %Uuid::new_v4(), source = %job.source);

        tokio::spawn(
            async move {
                if let Err(e) = service.execute(job, &tx).await {
                    error!(status = e.status_code(), "Pin failed: {}", e);
                    let _ = tx.send(PinEvent::Failed(e)).await;
                }
            }
            .instrument(span),
        );

        rx
    }

    /// Run enumerate → pin → log → record, reporting progress on `tx`
    pub async fn execute(
        &self,
        job: PinJob,
        tx: &mpsc::Sender<PinEvent>,
    ) -> GexpinResult<PackageRecord> {
        let PinJob { source, resolved } = job;
        let Resolved { version, hash } = resolved;

        emit(
            tx,
            PinEvent::Started {
                source: source.clone(),
                version: version.clone(),
                hash: hash.clone(),
            },
        )
        .await;

        self.enumerate(&hash, tx).await?;
        emit(tx, PinEvent::RefsDone).await;

        bounded(self.timeouts.pin, "pin", self.storage.pin(&hash)).await??;
        info!("Pinned {}", hash);

        let record = PackageRecord::new(source, hash, version);
        self.audit.append(&record).await?;
        self.recent.record(record.clone());

        emit(tx, PinEvent::Completed(record.clone())).await;
        Ok(record)
    }

    async fn enumerate(&self, hash: &str, tx: &mpsc::Sender<PinEvent>) -> GexpinResult<()> {
        let deadline = self.timeouts.fetch.map(|after| (Instant::now() + after, after));

        let mut refs = before(deadline, "refs", self.storage.refs(hash)).await??;
        emit(tx, PinEvent::RefsStarted).await;

        let mut count = 0usize;
        while let Some(reference) = before(deadline, "refs", refs.next()).await? {
            emit(tx, PinEvent::Ref(reference?)).await;
            count += 1;
        }

        debug!("Fetched {} references under {}", count, hash);
        Ok(())
    }
}

async fn emit(tx: &mpsc::Sender<PinEvent>, event: PinEvent) {
    if tx.send(event).await.is_err() {
        debug!("Client went away, continuing without progress output");
    }
}

async fn bounded<F: Future>(
    limit: Option<Duration>,
    operation: &'static str,
    fut: F,
) -> GexpinResult<F::Output> {
    before(limit.map(|after| (Instant::now() + after, after)), operation, fut).await
}

async fn before<F: Future>(
    deadline: Option<(Instant, Duration)>,
    operation: &'static str,
    fut: F,
) -> GexpinResult<F::Output> {
    match deadline {
        Some((at, after)) => tokio::time::timeout_at(at, fut)
            .await
            .map_err(|_| GexpinError::Timeout { operation, after }),
        None => Ok(fut.await),
    }
}
