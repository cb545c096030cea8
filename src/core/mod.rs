//! Core decoding building blocks
//!
//! Typed values and field schemas, allele normalization, the mutation-class
//! taxonomy, error types and line sources.

pub mod allele;
mod error;
pub mod io;
pub mod mclass;
pub mod value;

pub use allele::{normalize, normalize_allele, NormalizedAllele, VariantType};
pub use error::{summarize_warnings, DecodeError, DecodeWarning, Result};
pub use io::{open_vcf, CompressionFormat, LineIterator, SmartReader};
pub use mclass::{classify, Consequence, DatatypeTag, MutationClass};
pub use value::{FieldSchema, NumberArity, Value, ValueType};
