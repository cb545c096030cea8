//! Error types for VcfDecode
//!
//! Fatal errors stop a header parse or reject a single data line.
//! Everything else is a [`DecodeWarning`]: collected, summarized, never fatal.

use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Fatal decoding errors
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Missing or truncated `#CHROM` line; the sample list is indeterminate
    #[error("Malformed header: {message}")]
    MalformedHeader { message: String },

    /// The caller's sample rename function changed the sample count
    #[error("Sample rename changed cardinality: expected {expected} names, got {found}")]
    SampleRenameMismatch { expected: usize, found: usize },

    /// A data line that cannot be decoded at all
    #[error("Malformed data line: {message}")]
    MalformedDataLine { message: String },

    /// I/O error from the line source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DecodeError {
    pub fn malformed_header(message: impl Into<String>) -> Self {
        DecodeError::MalformedHeader {
            message: message.into(),
        }
    }

    pub fn malformed_line(message: impl Into<String>) -> Self {
        DecodeError::MalformedDataLine {
            message: message.into(),
        }
    }
}

/// Non-fatal problems found while decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeWarning {
    /// A `##INFO`/`##FORMAT` line that could not be used (e.g. no `ID`)
    MalformedMetaLine { line: String, reason: String },
    /// CSQ/ANN declared, but no column list could be read from its Description
    AnnotationFormatUnparsed { key: String, description: String },
    /// INFO key with no `##INFO` declaration
    UnknownInfoKey(String),
    /// FORMAT key with no `##FORMAT` declaration
    UnknownFormatKey(String),
    /// CSQ/ANN data present but no column schema was parsed from the header
    AnnotationHeaderUnavailable(String),
    /// ALT allele starting with `<` that is not a well-formed `<NAME>`
    InvalidSymbolicAllele(String),
}

impl DecodeWarning {
    /// Short label used when grouping warnings
    pub fn kind(&self) -> &'static str {
        match self {
            DecodeWarning::MalformedMetaLine { .. } => "malformed meta lines",
            DecodeWarning::AnnotationFormatUnparsed { .. } => "unparsed annotation formats",
            DecodeWarning::UnknownInfoKey(_) => "unknown INFO keys",
            DecodeWarning::UnknownFormatKey(_) => "unknown FORMAT keys",
            DecodeWarning::AnnotationHeaderUnavailable(_) => "annotations without header",
            DecodeWarning::InvalidSymbolicAllele(_) => "invalid symbolic alleles",
        }
    }

    fn subject(&self) -> &str {
        match self {
            DecodeWarning::MalformedMetaLine { reason, .. } => reason,
            DecodeWarning::AnnotationFormatUnparsed { key, .. } => key,
            DecodeWarning::UnknownInfoKey(key)
            | DecodeWarning::UnknownFormatKey(key)
            | DecodeWarning::AnnotationHeaderUnavailable(key)
            | DecodeWarning::InvalidSymbolicAllele(key) => key,
        }
    }
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::MalformedMetaLine { line, reason } => {
                write!(f, "{}: {}", reason, line.chars().take(100).collect::<String>())
            }
            DecodeWarning::AnnotationFormatUnparsed { key, description } => {
                write!(f, "cannot parse {} format from description: {}", key, description)
            }
            DecodeWarning::UnknownInfoKey(key) => write!(f, "unknown INFO key: {}", key),
            DecodeWarning::UnknownFormatKey(key) => write!(f, "unknown FORMAT key: {}", key),
            DecodeWarning::AnnotationHeaderUnavailable(key) => {
                write!(f, "{} present but no column header was declared", key)
            }
            DecodeWarning::InvalidSymbolicAllele(allele) => {
                write!(f, "invalid symbolic allele: {}", allele)
            }
        }
    }
}

/// Render a batched summary of warnings: one clause per kind, with the count
/// and the distinct subjects. Returns `None` when there is nothing to report.
pub fn summarize_warnings(warnings: &[DecodeWarning]) -> Option<String> {
    if warnings.is_empty() {
        return None;
    }

    let mut groups: Vec<(&'static str, usize, BTreeSet<&str>)> = Vec::new();
    for warning in warnings {
        let kind = warning.kind();
        match groups.iter_mut().find(|(k, _, _)| *k == kind) {
            Some((_, count, subjects)) => {
                *count += 1;
                subjects.insert(warning.subject());
            }
            None => {
                let mut subjects = BTreeSet::new();
                subjects.insert(warning.subject());
                groups.push((kind, 1, subjects));
            }
        }
    }

    let clauses: Vec<String> = groups
        .into_iter()
        .map(|(kind, count, subjects)| {
            let names: Vec<&str> = subjects.into_iter().collect();
            format!("{} {} ({})", count, kind, names.join(", "))
        })
        .collect();

    Some(clauses.join("; "))
}

/// Result type alias for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;
