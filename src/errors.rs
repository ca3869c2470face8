//! Error taxonomy for the detect core (spec.md section 7).
//!
//! Each variant carries the function name and the offending value so the
//! single diagnostic line the caller prints has everything it needs. There
//! is no retry policy at this layer: `IOFailure`, `InvalidReference` and
//! `AlignmentCorrupt` all abort the run that raised them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("{function}: invalid reference base/position {detail}")]
    InvalidReference { function: &'static str, detail: String },

    #[error("{function}: alignment corrupt ({detail})")]
    AlignmentCorrupt { function: &'static str, detail: String },

    #[error("{function}: unsupported cigar ({detail})")]
    UnsupportedCigar { function: &'static str, detail: String },

    #[error("{function}: I/O failure for {path}: {source}")]
    IoFailure {
        function: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{function}: reference corrupt ({detail})")]
    ReferenceCorrupt { function: &'static str, detail: String },
}

impl DetectError {
    pub fn invalid_reference(function: &'static str, detail: impl Into<String>) -> Self {
        DetectError::InvalidReference { function, detail: detail.into() }
    }

    pub fn alignment_corrupt(function: &'static str, detail: impl Into<String>) -> Self {
        DetectError::AlignmentCorrupt { function, detail: detail.into() }
    }

    pub fn unsupported_cigar(function: &'static str, detail: impl Into<String>) -> Self {
        DetectError::UnsupportedCigar { function, detail: detail.into() }
    }

    pub fn reference_corrupt(function: &'static str, detail: impl Into<String>) -> Self {
        DetectError::ReferenceCorrupt { function, detail: detail.into() }
    }

    /// Logs the single user-visible diagnostic line and returns self, so call
    /// sites can do `return Err(err.logged())` at the point of detection.
    pub fn logged(self) -> Self {
        log::error!("{}", self);
        self
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
