//! Per-identifier download results.

use std::fmt;
use std::path::PathBuf;

/// Terminal state of one identifier's download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Verified and written under the identifier's name.
    Success,
    /// The content's SHA-256 did not match the identifier; nothing written.
    IntegrityError,
    /// No 200 response. `status` is `None` when no response arrived at all.
    TransportError { status: Option<u32> },
    /// Verified content could not be persisted.
    StorageError(String),
}

impl DownloadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadOutcome::Success)
    }
}

impl fmt::Display for DownloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadOutcome::Success => write!(f, "SUCCESS"),
            DownloadOutcome::IntegrityError => write!(f, "ERROR - integrity check"),
            DownloadOutcome::TransportError { status: Some(code) } => {
                write!(f, "ERROR - status code {}", code)
            }
            DownloadOutcome::TransportError { status: None } => {
                write!(f, "ERROR - no response")
            }
            DownloadOutcome::StorageError(msg) => write!(f, "ERROR - storage: {}", msg),
        }
    }
}

/// Outcome for one identifier, with the stored path on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadReport {
    pub identifier: String,
    pub outcome: DownloadOutcome,
    pub path: Option<PathBuf>,
}

impl DownloadReport {
    pub(crate) fn failed(identifier: &str, outcome: DownloadOutcome) -> Self {
        Self {
            identifier: identifier.to_string(),
            outcome,
            path: None,
        }
    }
}
