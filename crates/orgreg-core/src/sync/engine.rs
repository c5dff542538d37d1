//! Sync engine
//!
//! One sync invocation walks `Idle → Resolving → Connecting →
//! (Uploading | Downloading) → Done | Failed`; the current phase is
//! published on a watch channel so callers can drive a status indicator
//! without blocking.
//!
//! Reconciliation is last-writer-wins full replace in both directions:
//! an upload overwrites every remote row with the active collection, a
//! download rebuilds the active collection from the remote rows. There
//! is no merge and no automatic retry.
//!
//! Silent syncs are enqueued fire-and-forget on an unbounded channel and
//! processed by a single spawned consumer, so at most one sync is in
//! flight and each mutation's resulting state is the one uploaded.

use std::sync::Arc;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::client::{Mirror, MirrorHandle};
use super::error::SyncError;
use super::target::MirrorTarget;
use crate::config::Config;
use crate::models::Record;
use crate::store::Registry;

/// Fixed column order of the remote mirror's first table
pub const MIRROR_HEADER: [&str; 7] = [
    "type", "name", "director", "phone", "taxId", "comment", "id",
];

/// Where a sync invocation currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing in flight
    Idle,
    /// Resolving the mirror identifier
    Resolving,
    /// Checking credentials and opening the resource
    Connecting,
    /// Overwriting the remote table
    Uploading,
    /// Rebuilding the local collection from the remote table
    Downloading,
    /// Last invocation finished cleanly
    Done,
    /// Last invocation failed
    Failed,
}

/// Sync direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Local collection overwrites the mirror
    Upload,
    /// Mirror overwrites the local collection
    Download,
}

/// How the invocation was triggered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Background, after a local mutation; upload only, failures are
    /// logged and reflected in the phase indicator, never surfaced
    Silent,
    /// User-invoked; may upload or download, errors go back to the caller
    Interactive,
}

/// One queued sync invocation
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub mode: SyncMode,
    /// Identifier override; falls back to the configured mirror target
    pub target: Option<String>,
}

impl SyncRequest {
    /// Background upload against the configured target
    pub fn silent() -> Self {
        Self {
            direction: SyncDirection::Upload,
            mode: SyncMode::Silent,
            target: None,
        }
    }

    /// User-invoked sync, optionally against a pasted identifier
    pub fn interactive(direction: SyncDirection, target: Option<String>) -> Self {
        Self {
            direction,
            mode: SyncMode::Interactive,
            target,
        }
    }
}

/// Outcome of a successful invocation
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub direction: SyncDirection,
    /// The key the identifier resolved to; interactive callers persist
    /// this into config for future silent syncs
    pub resolved_key: String,
    /// Data rows transferred (header excluded)
    pub rows: usize,
}

/// The sync engine
pub struct SyncEngine<M: Mirror> {
    registry: Arc<Mutex<Registry>>,
    mirror: M,
    default_target: Option<String>,
    phase_tx: watch::Sender<SyncPhase>,
    phase_rx: watch::Receiver<SyncPhase>,
}

impl<M: Mirror> SyncEngine<M> {
    /// Create an engine over a shared registry and a mirror client
    pub fn new(registry: Arc<Mutex<Registry>>, mirror: M, config: &Config) -> Self {
        let (phase_tx, phase_rx) = watch::channel(SyncPhase::Idle);
        Self {
            registry,
            mirror,
            default_target: config.mirror.clone(),
            phase_tx,
            phase_rx,
        }
    }

    /// The current phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase_rx.borrow()
    }

    /// Subscribe to phase changes (status indicator)
    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase_rx.clone()
    }

    /// Perform one sync invocation
    ///
    /// A single attempt: every failure is terminal for this invocation.
    pub async fn sync_once(&self, request: SyncRequest) -> Result<SyncReport, SyncError> {
        match self.run(&request).await {
            Ok(report) => {
                self.set_phase(SyncPhase::Done);
                info!(
                    direction = ?report.direction,
                    key = %report.resolved_key,
                    rows = report.rows,
                    "Sync complete"
                );
                Ok(report)
            }
            Err(e) => {
                self.set_phase(SyncPhase::Failed);
                match request.mode {
                    // Silent failures surface nowhere else, so log them here
                    SyncMode::Silent => match &e {
                        SyncError::Transport(_) | SyncError::Api { .. } => {
                            error!("Silent sync failed: {:?}", e);
                        }
                        _ => warn!("Silent sync failed: {}", e),
                    },
                    // Interactive errors go back to the caller
                    SyncMode::Interactive => debug!("Sync failed: {}", e),
                }
                Err(e)
            }
        }
    }

    async fn run(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        self.set_phase(SyncPhase::Resolving);
        let input = request
            .target
            .clone()
            .or_else(|| self.default_target.clone())
            .ok_or(SyncError::NoTarget)?;
        let target = MirrorTarget::resolve(&input);
        info!("Resolved mirror identifier to {}", target.describe());

        // Silent syncs only ever upload
        let direction = match request.mode {
            SyncMode::Silent => SyncDirection::Upload,
            SyncMode::Interactive => request.direction,
        };

        self.set_phase(SyncPhase::Connecting);
        self.mirror.check_credentials()?;

        let handle = self.open_or_create(&target, direction).await?;

        match direction {
            SyncDirection::Upload => self.upload(&handle).await,
            SyncDirection::Download => self.download(&handle).await,
        }
    }

    /// Open the resolved target; a missing name is created on upload
    ///
    /// Any other open failure is fatal for this invocation.
    async fn open_or_create(
        &self,
        target: &MirrorTarget,
        direction: SyncDirection,
    ) -> Result<MirrorHandle, SyncError> {
        match self.mirror.open(target).await {
            Ok(handle) => Ok(handle),
            Err(SyncError::NotFound { .. })
                if direction == SyncDirection::Upload && matches!(target, MirrorTarget::Name(_)) =>
            {
                let MirrorTarget::Name(name) = target else {
                    unreachable!()
                };
                info!("Mirror '{}' not found, creating it", name);
                self.mirror.create(name).await
            }
            Err(e) => Err(e),
        }
    }

    async fn upload(&self, handle: &MirrorHandle) -> Result<SyncReport, SyncError> {
        self.set_phase(SyncPhase::Uploading);

        // Hold the registry lock only while serializing rows, so the
        // uploaded snapshot is one consistent state.
        let rows = {
            let registry = self.registry.lock().await;
            records_to_rows(registry.records())
        };
        let count = rows.len() - 1;

        self.mirror.replace_rows(handle, rows).await?;

        Ok(SyncReport {
            direction: SyncDirection::Upload,
            resolved_key: handle.key.clone(),
            rows: count,
        })
    }

    async fn download(&self, handle: &MirrorHandle) -> Result<SyncReport, SyncError> {
        self.set_phase(SyncPhase::Downloading);

        let rows = self.mirror.fetch_rows(handle).await?;
        let records = rows_to_records(&rows);
        let count = records.len();

        let mut registry = self.registry.lock().await;
        registry
            .replace_all(records)
            .map_err(|e| SyncError::Apply(e.to_string()))?;

        Ok(SyncReport {
            direction: SyncDirection::Download,
            resolved_key: handle.key.clone(),
            rows: count,
        })
    }

    fn set_phase(&self, phase: SyncPhase) {
        let _ = self.phase_tx.send(phase);
    }

    /// Spawn the single background consumer and return its handle
    ///
    /// Requests are processed one at a time in arrival order, which gives
    /// the single-flight guarantee. Callers enqueue and move on.
    pub fn spawn(self) -> SyncHandle
    where
        M: 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<SyncRequest>();
        let phase_rx = self.phase_rx.clone();

        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                // sync_once already logs failures; silent mode surfaces
                // nothing beyond the phase indicator
                let _ = self.sync_once(request).await;
            }
        });

        SyncHandle { tx, phase_rx, task }
    }
}

/// Handle to the spawned sync consumer
pub struct SyncHandle {
    tx: mpsc::UnboundedSender<SyncRequest>,
    phase_rx: watch::Receiver<SyncPhase>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Enqueue a request, fire-and-forget
    pub fn enqueue(&self, request: SyncRequest) {
        let _ = self.tx.send(request);
    }

    /// The consumer's current phase
    pub fn phase(&self) -> SyncPhase {
        *self.phase_rx.borrow()
    }

    /// Subscribe to phase changes
    pub fn subscribe_phase(&self) -> watch::Receiver<SyncPhase> {
        self.phase_rx.clone()
    }

    /// Close the queue and wait for queued requests to finish
    ///
    /// Used at process shutdown so a just-enqueued silent upload still
    /// completes; not a join callers use mid-flight.
    pub async fn shutdown(self) {
        drop(self.tx);
        let _ = self.task.await;
    }
}

/// Serialize the active collection in the fixed mirror column order
fn records_to_rows(records: &[Record]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(MIRROR_HEADER.iter().map(|h| h.to_string()).collect());
    for record in records {
        rows.push(vec![
            record.kind.clone(),
            record.name.clone(),
            record.director.clone(),
            record.phone.clone(),
            record.tax_id.clone(),
            record.comment.clone(),
            record.id.to_string(),
        ]);
    }
    rows
}

/// Rebuild records from remote rows, mapping columns by header name
///
/// Unknown columns are ignored, missing ones are empty. Rows without a
/// parsable id get a fresh one. Blank rows are skipped.
fn rows_to_records(rows: &[Vec<String>]) -> Vec<Record> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let col = |name: &str| header.iter().position(|h| h == name);
    let kind_col = col("type");
    let name_col = col("name");
    let director_col = col("director");
    let phone_col = col("phone");
    let tax_id_col = col("taxId");
    let comment_col = col("comment");
    let id_col = col("id");

    let field = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    data.iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .map(|row| {
            let id = id_col
                .and_then(|i| row.get(i))
                .and_then(|cell| Uuid::parse_str(cell).ok())
                .unwrap_or_else(Uuid::new_v4);

            let mut record = Record::with_id(id, field(row, kind_col), field(row, name_col));
            record.director = field(row, director_col);
            record.phone = field(row, phone_col);
            record.tax_id = field(row, tax_id_col);
            record.comment = field(row, comment_col);
            record
        })
        .collect()
}
