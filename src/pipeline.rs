//! Collection pipeline: one enumerate-and-dispatch pass across all sources.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future;
use log::{debug, info, warn};
use tokio::sync::{Mutex, Semaphore};

use crate::constants::{
    DEFAULT_CYCLE_DEADLINE_MARGIN_SECS, DEFAULT_CYCLE_INTERVAL_SECS, DEFAULT_MAX_ATTACHMENT_BYTES,
    DEFAULT_MAX_CONCURRENT_UPLOADS, DEFAULT_MAX_PER_SOURCE,
};
use crate::models::{
    CycleReport, JobPayload, MediaKind, MediaRecord, Outcome, Record, SourceCounts, SourceKind,
    UploadJob,
};
use crate::sources::SourceEnumerator;
use crate::upload::Deliver;

/// Tunables for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Records requested from each source per cycle
    pub max_per_source: usize,
    /// Attachment size cap; media at or above it ship metadata-only
    pub max_attachment_bytes: u64,
    /// Uploads allowed in flight simultaneously
    pub max_concurrent_uploads: usize,
    /// Wall-clock budget for one cycle; in-flight jobs are abandoned past it
    pub cycle_deadline: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_per_source: DEFAULT_MAX_PER_SOURCE,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            max_concurrent_uploads: DEFAULT_MAX_CONCURRENT_UPLOADS,
            cycle_deadline: Duration::from_secs(
                DEFAULT_CYCLE_INTERVAL_SECS - DEFAULT_CYCLE_DEADLINE_MARGIN_SECS,
            ),
        }
    }
}

/// Terminal outcomes observed so far within one cycle.
///
/// Completion order across concurrent jobs is unspecified, so these are
/// plain commutative counters.
#[derive(Debug, Clone, Default)]
struct CycleCounters {
    delivered: u64,
    rejected: u64,
    failed: u64,
    per_source: HashMap<SourceKind, SourceCounts>,
}

impl CycleCounters {
    fn record(&mut self, source: SourceKind, outcome: &Outcome) {
        let counts = self.per_source.entry(source).or_default();
        match outcome {
            Outcome::Delivered => {
                self.delivered += 1;
                counts.delivered += 1;
            }
            Outcome::Rejected(_) => {
                self.rejected += 1;
                counts.rejected += 1;
            }
            Outcome::Failed(_) => {
                self.failed += 1;
                counts.failed += 1;
            }
        }
    }
}

/// Orchestrates collection cycles: pulls records from every configured
/// source, derives upload jobs, and dispatches them with bounded
/// concurrency.
///
/// A cycle never fails as a whole. Source errors skip that source, delivery
/// errors surface as per-job outcomes, and the report always returns
/// normally with `attempted = delivered + rejected + failed`.
pub struct CollectionPipeline {
    sources: Vec<Arc<dyn SourceEnumerator>>,
    deliverer: Arc<dyn Deliver>,
    settings: PipelineSettings,
}

impl CollectionPipeline {
    pub fn new(
        sources: Vec<Arc<dyn SourceEnumerator>>,
        deliverer: Arc<dyn Deliver>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sources,
            deliverer,
            settings,
        }
    }

    /// Run one collection cycle and report aggregated outcomes.
    pub async fn run_cycle(&self) -> CycleReport {
        let (jobs, downgraded) = self.enumerate_jobs().await;

        let mut attempted_per_source: HashMap<SourceKind, u64> = HashMap::new();
        for job in &jobs {
            *attempted_per_source.entry(job.source).or_default() += 1;
        }
        let attempted = jobs.len() as u64;

        let counters = Arc::new(Mutex::new(CycleCounters::default()));
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent_uploads));

        // Fire-and-continue dispatch: jobs queue on the semaphore rather
        // than spawning unbounded workers.
        let mut handles = Vec::with_capacity(jobs.len());
        for job in jobs {
            let semaphore = Arc::clone(&semaphore);
            let deliverer = Arc::clone(&self.deliverer);
            let counters = Arc::clone(&counters);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                let outcome = deliverer.deliver(&job).await;
                counters.lock().await.record(job.source, &outcome);
            }));
        }

        if tokio::time::timeout(self.settings.cycle_deadline, future::join_all(handles))
            .await
            .is_err()
        {
            warn!(
                "Cycle deadline of {:?} expired, abandoning in-flight uploads",
                self.settings.cycle_deadline
            );
        }

        let snapshot = counters.lock().await.clone();
        let report = assemble_report(attempted, attempted_per_source, snapshot, downgraded);

        info!(
            "Cycle complete: attempted={} delivered={} rejected={} failed={} downgraded={}",
            report.attempted, report.delivered, report.rejected, report.failed, report.downgraded
        );
        for (source, counts) in &report.per_source {
            debug!(
                "  {}: attempted={} delivered={} rejected={} failed={}",
                source, counts.attempted, counts.delivered, counts.rejected, counts.failed
            );
        }
        report
    }

    /// Enumerate every source and derive this cycle's upload jobs.
    ///
    /// A single source's failure never aborts the cycle; the source is
    /// skipped and the rest proceed.
    async fn enumerate_jobs(&self) -> (Vec<UploadJob>, u64) {
        let mut jobs = Vec::new();
        let mut downgraded = 0u64;

        for source in &self.sources {
            let kind = source.kind();
            match source.list(self.settings.max_per_source).await {
                Ok(records) => {
                    debug!("Source {} yielded {} records", kind, records.len());
                    downgraded +=
                        build_jobs(kind, records, self.settings.max_attachment_bytes, &mut jobs);
                }
                Err(e) => {
                    warn!("Source {} unavailable this cycle: {}", kind, e);
                }
            }
        }
        (jobs, downgraded)
    }
}

/// Derive upload jobs from one source's records, in yield order.
///
/// Media under the attachment cap become one multipart job each; oversized
/// media are downgraded into a metadata-only batch per media kind. Apps are
/// aggregated into a single job. Returns the downgrade count.
fn build_jobs(
    source: SourceKind,
    records: Vec<Record>,
    max_attachment_bytes: u64,
    jobs: &mut Vec<UploadJob>,
) -> u64 {
    let mut downgraded = 0u64;
    let mut oversized: HashMap<MediaKind, Vec<MediaRecord>> = HashMap::new();
    let mut apps = Vec::new();

    for record in records {
        match record {
            Record::Media(media) => {
                if media.size_bytes < max_attachment_bytes {
                    jobs.push(UploadJob {
                        source,
                        payload: JobPayload::MediaFile(media),
                    });
                } else {
                    warn!(
                        "Media {} is {} bytes, over the {} byte attachment cap; \
                         shipping metadata only",
                        media.display_name, media.size_bytes, max_attachment_bytes
                    );
                    downgraded += 1;
                    oversized.entry(media.kind).or_default().push(media);
                }
            }
            Record::Device(device) => jobs.push(UploadJob {
                source,
                payload: JobPayload::Device(device),
            }),
            Record::App(app) => apps.push(app),
            Record::Event(event) => jobs.push(UploadJob {
                source,
                payload: JobPayload::Event(event),
            }),
        }
    }

    if !apps.is_empty() {
        jobs.push(UploadJob {
            source,
            payload: JobPayload::Apps(apps),
        });
    }
    for (kind, records) in oversized {
        jobs.push(UploadJob {
            source,
            payload: JobPayload::MediaMetadata { kind, records },
        });
    }
    downgraded
}

/// Fold observed outcomes into the final report.
///
/// Jobs with no terminal outcome by the deadline were abandoned; they count
/// as failed, which keeps `attempted = delivered + rejected + failed`.
fn assemble_report(
    attempted: u64,
    attempted_per_source: HashMap<SourceKind, u64>,
    snapshot: CycleCounters,
    downgraded: u64,
) -> CycleReport {
    let mut per_source = snapshot.per_source;
    for (source, source_attempted) in attempted_per_source {
        let counts = per_source.entry(source).or_default();
        counts.attempted = source_attempted;
        counts.failed = source_attempted - counts.delivered - counts.rejected;
    }

    let failed = attempted - snapshot.delivered - snapshot.rejected;
    let abandoned = failed - snapshot.failed;
    if abandoned > 0 {
        warn!("{} uploads abandoned at the cycle deadline", abandoned);
    }

    CycleReport {
        attempted,
        delivered: snapshot.delivered,
        rejected: snapshot.rejected,
        failed,
        downgraded,
        per_source,
    }
}
