//! Batch runner: apply one [`JobConfig`] to many input files.
//!
//! Each input is processed independently: decode → resolve geometry →
//! render → encode → atomic write. A failure on one item is recorded in its
//! [`JobResult`] and never aborts the rest of the batch. The report lists
//! results in input order regardless of completion order.
//!
//! ## Entry points
//!
//! | Function | Execution |
//! |---|---|
//! | [`run`] / [`run_with_backend`] | parallel on the rayon pool, returns a [`BatchReport`] |
//! | [`iter_with_backend`] | lazy, sequential, one [`JobResult`] per `next()` |
//!
//! ## Output safety
//!
//! Output names are planned up front (see [`naming`](crate::naming)). Each
//! output is encoded to a temporary file in the output directory and renamed
//! into place, so a failed or cancelled item never leaves a partial file.
//!
//! ## Cancellation
//!
//! [`CancelToken`] is checked when an item starts and again before its output
//! is written. Items not yet started are reported as
//! [`JobOutcome::NotAttempted`]; an item cancelled after decoding writes
//! nothing and fails with [`ErrorKind::Cancelled`].

use crate::imaging::{
    BackendError, CompositeError, Dimensions, GeometryError, ImageBackend, RustBackend, render,
    resolve_with_policy,
};
use crate::naming::{OutputPlan, plan_outputs};
use crate::types::{ErrorKind, JobConfig};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that stop a batch before any item runs.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("cannot create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-item failure.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cancelled before the output was written")]
    Cancelled,
}

impl ItemError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ItemError::Geometry(
                GeometryError::InvalidDimension { .. } | GeometryError::CanvasTooLarge { .. },
            ) => ErrorKind::InvalidDimension,
            ItemError::Geometry(GeometryError::InvalidRatio { .. }) => ErrorKind::InvalidRatio,
            ItemError::Backend(e) => e.kind(),
            ItemError::Composite(e) => e.kind(),
            ItemError::Write { .. } => ErrorKind::WriteError,
            ItemError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Cooperative cancellation flag shared between the caller and the batch.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum JobOutcome {
    Success {
        output: PathBuf,
        dimensions: Dimensions,
    },
    Failure {
        kind: ErrorKind,
        message: String,
    },
    /// Collision policy `skip` found an existing output.
    Skipped { output: PathBuf },
    /// Cancelled before this item started.
    NotAttempted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResult {
    pub input: PathBuf,
    #[serde(flatten)]
    pub outcome: JobOutcome,
}

impl JobResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, JobOutcome::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, JobOutcome::Failure { .. })
    }
}

/// Outcome counts for a whole batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_attempted: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} failed, {} skipped",
            self.succeeded, self.failed, self.skipped
        )?;
        if self.not_attempted > 0 {
            write!(f, ", {} not attempted", self.not_attempted)?;
        }
        Ok(())
    }
}

/// Every item's result, in input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub summary: Summary,
    pub results: Vec<JobResult>,
}

impl BatchReport {
    pub fn new(results: Vec<JobResult>) -> Self {
        let mut summary = Summary {
            total: results.len(),
            ..Summary::default()
        };
        for r in &results {
            match r.outcome {
                JobOutcome::Success { .. } => summary.succeeded += 1,
                JobOutcome::Failure { .. } => summary.failed += 1,
                JobOutcome::Skipped { .. } => summary.skipped += 1,
                JobOutcome::NotAttempted => summary.not_attempted += 1,
            }
        }
        Self { summary, results }
    }

    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobResult> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

/// Progress events sent to the caller while a batch runs.
#[derive(Debug, Clone)]
pub enum BatchEvent {
    Started {
        total: usize,
        output_dir: PathBuf,
    },
    ItemFinished {
        /// 1-based position in the input list.
        index: usize,
        total: usize,
        result: JobResult,
    },
}

/// Caller-side knobs that are not part of the job itself.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub cancel: CancelToken,
    pub events: Option<Sender<BatchEvent>>,
}

/// One planned unit of work.
#[derive(Debug, Clone)]
struct Item {
    index: usize,
    input: PathBuf,
    plan: OutputPlan,
}

fn prepare(inputs: &[PathBuf], output_dir: &Path, job: &JobConfig) -> Result<Vec<Item>, BatchError> {
    std::fs::create_dir_all(output_dir).map_err(|source| BatchError::OutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;
    Ok(plan_outputs(inputs, output_dir, job)
        .into_iter()
        .zip(inputs)
        .enumerate()
        .map(|(i, (plan, input))| Item {
            index: i + 1,
            input: input.clone(),
            plan,
        })
        .collect())
}

/// Run a batch with the default [`RustBackend`].
pub fn run(
    inputs: &[PathBuf],
    job: &JobConfig,
    output_dir: &Path,
    options: RunOptions,
) -> Result<BatchReport, BatchError> {
    run_with_backend(&RustBackend::new(), inputs, job, output_dir, options)
}

/// Run a batch in parallel using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    job: &JobConfig,
    output_dir: &Path,
    options: RunOptions,
) -> Result<BatchReport, BatchError> {
    let items = prepare(inputs, output_dir, job)?;
    let total = items.len();
    info!(total, output_dir = %output_dir.display(), "starting batch");

    if let Some(tx) = &options.events {
        let _ = tx.send(BatchEvent::Started {
            total,
            output_dir: output_dir.to_path_buf(),
        });
    }

    let results: Vec<JobResult> = items
        .par_iter()
        .map(|item| {
            let result = process_item(backend, job, item, &options.cancel);
            if let Some(tx) = &options.events {
                let _ = tx.send(BatchEvent::ItemFinished {
                    index: item.index,
                    total,
                    result: result.clone(),
                });
            }
            result
        })
        .collect();

    let report = BatchReport::new(results);
    info!(summary = %report.summary, "batch finished");
    Ok(report)
}

/// Lazy sequential batch. Output names are planned when this is called;
/// each `next()` processes one item. Dropping the iterator stops the batch.
pub fn iter_with_backend<'a, B: ImageBackend>(
    backend: &'a B,
    inputs: &[PathBuf],
    job: &'a JobConfig,
    output_dir: &Path,
    cancel: CancelToken,
) -> Result<BatchIter<'a, B>, BatchError> {
    let items = prepare(inputs, output_dir, job)?;
    Ok(BatchIter {
        backend,
        job,
        items: items.into_iter(),
        cancel,
    })
}

pub struct BatchIter<'a, B: ImageBackend> {
    backend: &'a B,
    job: &'a JobConfig,
    items: std::vec::IntoIter<Item>,
    cancel: CancelToken,
}

impl<B: ImageBackend> Iterator for BatchIter<'_, B> {
    type Item = JobResult;

    fn next(&mut self) -> Option<JobResult> {
        let item = self.items.next()?;
        Some(process_item(self.backend, self.job, &item, &self.cancel))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<B: ImageBackend> ExactSizeIterator for BatchIter<'_, B> {}

fn process_item(
    backend: &impl ImageBackend,
    job: &JobConfig,
    item: &Item,
    cancel: &CancelToken,
) -> JobResult {
    let outcome = if cancel.is_cancelled() {
        JobOutcome::NotAttempted
    } else {
        match &item.plan {
            OutputPlan::Skip { existing } => {
                info!(input = %item.input.display(), existing = %existing.display(), "skipped, output exists");
                JobOutcome::Skipped {
                    output: existing.clone(),
                }
            }
            OutputPlan::Write { path, replace } => {
                match render_item(backend, job, &item.input, path, *replace, cancel) {
                    Ok(dimensions) => JobOutcome::Success {
                        output: path.clone(),
                        dimensions,
                    },
                    Err(e) => {
                        warn!(input = %item.input.display(), error = %e, "item failed");
                        JobOutcome::Failure {
                            kind: e.kind(),
                            message: e.to_string(),
                        }
                    }
                }
            }
        }
    };

    JobResult {
        input: item.input.clone(),
        outcome,
    }
}

#[tracing::instrument(skip(backend, job, input, replace, cancel), fields(input = %input.display()))]
fn render_item(
    backend: &impl ImageBackend,
    job: &JobConfig,
    input: &Path,
    target: &Path,
    replace: bool,
    cancel: &CancelToken,
) -> Result<Dimensions, ItemError> {
    let source = backend.decode(input)?;
    let geometry = resolve_with_policy(
        source.width(),
        source.height(),
        job.aspect_ratio,
        job.mode,
        job.size_policy,
    )?;
    debug!(?geometry, "resolved geometry");

    let canvas = render(
        &source,
        &geometry,
        job.background.as_ref(),
        job.watermark.as_ref(),
    )?;
    drop(source);

    let bytes = backend.encode(&canvas, job.output.format, job.output.quality)?;
    if cancel.is_cancelled() {
        return Err(ItemError::Cancelled);
    }
    write_atomic(target, &bytes, replace)?;
    debug!(bytes = bytes.len(), output = %target.display(), "written");
    Ok(canvas.dimensions().into())
}

/// Write `bytes` to a temp file beside `target`, then rename it into place.
/// Without `replace` an existing `target` is an error, not a clobber.
fn write_atomic(target: &Path, bytes: &[u8], replace: bool) -> Result<(), ItemError> {
    let write_err = |source| ItemError::Write {
        path: target.to_path_buf(),
        source,
    };
    let dir = target.parent().unwrap_or(Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".framefit-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    let persisted = if replace {
        tmp.persist(target)
    } else {
        tmp.persist_noclobber(target)
    };
    persisted.map(|_| ()).map_err(|e| write_err(e.error))
}
