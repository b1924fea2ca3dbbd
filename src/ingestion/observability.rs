use std::fmt;
use std::sync::Arc;

use crate::error::UploadError;

use super::upload::UploadFormat;

/// Alert threshold used when none is configured.
pub const DEFAULT_ALERT_THRESHOLD: IngestionSeverity = IngestionSeverity::Critical;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (the payload could not even be decoded).
    Critical,
}

impl IngestionSeverity {
    /// Severity assigned to a failed upload.
    pub fn for_error(e: &UploadError) -> Self {
        match e {
            UploadError::DecodeFailure { .. } => IngestionSeverity::Critical,
            UploadError::UnsupportedFormat { .. } | UploadError::ParseFailure { .. } => IngestionSeverity::Error,
            UploadError::ValidationFailure { .. } => IngestionSeverity::Warning,
        }
    }
}

/// Context about an upload attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Filename reported by the browser.
    pub filename: String,
    /// Format selected from the filename, when one matched.
    pub format: Option<UploadFormat>,
}

/// Minimal stats reported on a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of parsed rows.
    pub rows: usize,
    /// Number of parsed columns.
    pub columns: usize,
}

/// Observer interface for upload outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when an upload is decoded successfully.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when an upload fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &UploadError) {}

    /// Called when an upload failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &UploadError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &UploadError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &UploadError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs upload events through `tracing`.
///
/// Failures at or above `alert_at_or_above` are logged once, at `error`, by
/// [`IngestionObserver::on_alert`]. Keep the threshold equal to the one in the
/// [`super::DecodeOptions`] this observer is attached to.
#[derive(Debug, Clone, Copy)]
pub struct TracingObserver {
    alert_at_or_above: IngestionSeverity,
}

impl TracingObserver {
    pub fn new(alert_at_or_above: IngestionSeverity) -> Self {
        Self { alert_at_or_above }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            filename = %ctx.filename,
            format = ?ctx.format,
            rows = stats.rows,
            columns = stats.columns,
            "upload decoded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &UploadError) {
        if severity >= self.alert_at_or_above {
            return;
        }
        tracing::warn!(
            filename = %ctx.filename,
            format = ?ctx.format,
            ?severity,
            %error,
            "upload rejected"
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &UploadError) {
        tracing::error!(
            filename = %ctx.filename,
            format = ?ctx.format,
            ?severity,
            %error,
            "upload rejected"
        );
    }
}
