//! Sync pass results

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::error::{Result, SyncError};

/// What happened to a single record or annotation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Written to the other side
    Created,
    /// The other side already has it
    Existing,
}

/// Per-document tally of a sync pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Annotations embedded or records imported
    pub created: usize,
    /// Already present on the other side
    pub existing: usize,
    /// Text could not be located on the page
    pub skipped: usize,
    /// Failed for another record-level reason, such as a position outside
    /// the document or a damaged page
    pub failed: usize,
}

impl SyncReport {
    /// Count one outcome; errors that concern more than the record are returned
    pub fn tally(&mut self, outcome: Result<RecordOutcome>) -> Result<()> {
        match outcome {
            Ok(RecordOutcome::Created) => self.created += 1,
            Ok(RecordOutcome::Existing) => self.existing += 1,
            Err(SyncError::NoMatchFound { page, text }) => {
                warn!(page, text = %text, "Text not found, skipping");
                self.skipped += 1;
            }
            Err(e) if e.is_record_level() => {
                warn!(error = %e, "Record failed");
                self.failed += 1;
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    pub fn total(&self) -> usize {
        self.created + self.existing + self.skipped + self.failed
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} created, {} existing, {} skipped, {} failed",
            self.created, self.existing, self.skipped, self.failed
        )
    }
}
