//! Core types and events

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Number of digits in a portal record identifier
pub const RECORD_ID_LEN: usize = 8;

/// An 8-digit portal record identifier
///
/// Construction goes through [`RecordId::parse`], so holding a `RecordId`
/// means the identifier is safe to put on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Parse an identifier, rejecting anything that is not exactly 8 ASCII digits
    ///
    /// ```
    /// use tender_sweep::types::RecordId;
    ///
    /// assert!(RecordId::parse("10098537").is_some());
    /// assert!(RecordId::parse("9999999").is_none());
    /// assert!(RecordId::parse("1009853a").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == RECORD_ID_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    /// The identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        RecordId::parse(&value).ok_or_else(|| format!("invalid record id: {value}"))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

/// Result of classifying a fetched notice page
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Neither a title nor a category field was found (no such record)
    Invalid,
    /// A real notice, but not about construction work
    ValidIrrelevant,
    /// A real notice that should be captured
    ValidRelevant,
}

/// Link to a structured attachment on a notice page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Absolute attachment URL
    pub url: url::Url,
    /// File name taken from the link target, spaces replaced by underscores
    pub filename: String,
}

/// Where a captured document came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// A downloaded bill-of-quantities attachment
    Attachment,
    /// A full-page rendering of the notice
    Snapshot,
}

/// One locally stored capture in the raw tier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureArtifact {
    /// Path of the uncompressed document
    pub path: PathBuf,
    /// Capture source
    pub kind: ArtifactKind,
}

/// A normalized table persisted to the clean tier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedTable {
    /// Path of the CSV file
    pub path: PathBuf,
    /// Number of data rows written
    pub rows: usize,
    /// Number of columns written
    pub columns: usize,
    /// Name of the strategy that produced the table
    pub strategy: String,
}

/// Everything produced for one relevant record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessedRecord {
    /// The identifier
    pub id: RecordId,
    /// The capture, if one was made
    pub artifact: Option<CaptureArtifact>,
    /// The archive written for the capture
    pub archive: Option<PathBuf>,
    /// The table extracted from an attachment capture
    pub table: Option<ExtractedTable>,
    /// Bytes evicted from the raw tier to make room for this capture
    pub pruned_bytes: u64,
}

impl ProcessedRecord {
    pub(crate) fn new(id: RecordId) -> Self {
        Self {
            id,
            artifact: None,
            archive: None,
            table: None,
            pruned_bytes: 0,
        }
    }
}

/// Why an identifier did not produce anything
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// The identifier is not 8 digits; nothing was fetched
    InvalidId,
    /// The page has no notice fields
    NoRecord,
    /// The notice is not relevant
    Irrelevant,
}

impl From<Classification> for Option<MissReason> {
    fn from(class: Classification) -> Self {
        match class {
            Classification::Invalid => Some(MissReason::NoRecord),
            Classification::ValidIrrelevant => Some(MissReason::Irrelevant),
            Classification::ValidRelevant => None,
        }
    }
}

/// Outcome of running the pipeline for a single identifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdOutcome {
    /// A relevant record was processed (capture may still have been skipped)
    Productive(ProcessedRecord),
    /// Nothing relevant at this identifier
    Miss(MissReason),
    /// The storage cap is reached under the stop-when-full policy
    StorageFull,
    /// An unexpected failure; logged and contained to this identifier
    Fault(String),
}

/// Sweep controller state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepState {
    /// No sweep has started
    Idle,
    /// A sweep is in progress
    Sweeping,
    /// Terminal state reached
    Finished(SweepOutcome),
}

/// Terminal state of a sweep
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepOutcome {
    /// The whole identifier range was visited
    Completed,
    /// Too many consecutive non-matches; likely past the end of valid data
    AbortedByMissStreak,
    /// The storage cap was reached under the stop-when-full policy
    AbortedByStorageFull,
    /// An external stop request was honored
    AbortedByInterrupt,
}

impl fmt::Display for SweepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SweepOutcome::Completed => "completed",
            SweepOutcome::AbortedByMissStreak => "aborted: too many consecutive misses",
            SweepOutcome::AbortedByStorageFull => "aborted: storage cap reached",
            SweepOutcome::AbortedByInterrupt => "aborted: interrupted",
        };
        f.write_str(s)
    }
}

/// Summary returned when a sweep reaches a terminal state
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// How the sweep ended
    pub outcome: SweepOutcome,
    /// Identifiers the pipeline ran for
    pub processed: u64,
    /// Identifiers that yielded a relevant record
    pub productive: u64,
    /// Identifiers counted as misses
    pub misses: u64,
    /// Identifiers that failed unexpectedly
    pub faults: u64,
    /// Captures written to the raw tier
    pub captures: u64,
    /// Tables written to the clean tier
    pub tables: u64,
    /// Bytes evicted by rolling prune
    pub pruned_bytes: u64,
    /// Last identifier the pipeline ran for
    pub last_id: Option<String>,
}

impl SweepReport {
    pub(crate) fn new() -> Self {
        Self {
            outcome: SweepOutcome::Completed,
            processed: 0,
            productive: 0,
            misses: 0,
            faults: 0,
            captures: 0,
            tables: 0,
            pruned_bytes: 0,
            last_id: None,
        }
    }
}

/// Event emitted while sweeping
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A sweep began
    SweepStarted {
        /// First identifier
        anchor: u64,
        /// Last identifier
        end: u64,
    },

    /// A notice page was classified
    Classified {
        /// Record identifier
        id: String,
        /// Classification result
        classification: Classification,
    },

    /// A document was captured to the raw tier
    Captured {
        /// Record identifier
        id: String,
        /// Capture source
        kind: ArtifactKind,
        /// Stored document
        path: PathBuf,
    },

    /// A relevant record produced no capture
    CaptureSkipped {
        /// Record identifier
        id: String,
        /// Why nothing was captured
        reason: String,
    },

    /// A table was written to the clean tier
    TableExtracted {
        /// Record identifier
        id: String,
        /// CSV path
        path: PathBuf,
        /// Data rows written
        rows: usize,
    },

    /// A capture was archived
    Archived {
        /// Record identifier
        id: String,
        /// Archive path
        path: PathBuf,
    },

    /// Raw archives were evicted by rolling prune
    Pruned {
        /// Removed archives, oldest first
        removed: Vec<PathBuf>,
        /// Bytes freed
        freed: u64,
    },

    /// An identifier failed unexpectedly
    Fault {
        /// Record identifier
        id: String,
        /// Error message
        error: String,
    },

    /// The sweep reached a terminal state
    SweepFinished {
        /// Final summary
        report: SweepReport,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_requires_exactly_eight_digits() {
        for bad in ["", "1234567", "123456789", "1234567a", " 1234567", "１２３４５６７８"] {
            assert!(RecordId::parse(bad).is_none(), "{bad:?} should be rejected");
        }
        let id = RecordId::parse("00000001").unwrap();
        assert_eq!(id.as_str(), "00000001");
        assert_eq!(id.to_string(), "00000001");
    }

    #[test]
    fn record_id_deserialization_validates() {
        let ok: RecordId = serde_json::from_str("\"10098537\"").unwrap();
        assert_eq!(ok.as_str(), "10098537");
        assert!(serde_json::from_str::<RecordId>("\"100985\"").is_err());
    }

    #[test]
    fn only_relevant_classification_is_productive() {
        assert_eq!(
            Option::<MissReason>::from(Classification::Invalid),
            Some(MissReason::NoRecord)
        );
        assert_eq!(
            Option::<MissReason>::from(Classification::ValidIrrelevant),
            Some(MissReason::Irrelevant)
        );
        assert_eq!(Option::<MissReason>::from(Classification::ValidRelevant), None);
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = Event::Captured {
            id: "10098537".into(),
            kind: ArtifactKind::Snapshot,
            path: PathBuf::from("boq_raw/10098537_notice.pdf"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "captured");
        assert_eq!(value["kind"], "snapshot");
    }
}
