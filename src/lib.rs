//! VcfDecode - VCF variant record decoding
//!
//! Turns VCF text into normalized, typed, per-allele variant records.
//!
//! # Features
//!
//! - `##INFO`/`##FORMAT` schemas drive typing of INFO and FORMAT values
//! - Multi-allelic loci split into one record per ALT allele
//! - REF/ALT trimming with position adjustment
//! - VEP `CSQ` and snpEff `ANN` parsing with consequence ranking
//! - Parallel batch decoding with rayon
//! - Plain, gzip and bzip2 input
//!
//! # Example
//!
//! ```ignore
//! use vcf_decode::{open_vcf, DecodeOptions, HeaderParser, LineIterator, VcfDecoder};
//!
//! let mut lines = LineIterator::new(open_vcf("calls.vcf.gz")?);
//! let mut decoder = VcfDecoder::from_reader(&mut lines, &HeaderParser::new(), DecodeOptions::default())?;
//!
//! let stats = decoder.decode_stream(&mut lines, |record| {
//!     println!("{}:{} {} {}", record.chrom, record.pos, record.mname, record.class);
//! })?;
//! ```

pub mod core;
pub mod formats;

// Re-export commonly used types
pub use core::{
    normalize, open_vcf, summarize_warnings, DecodeError, DecodeWarning, FieldSchema,
    LineIterator, MutationClass, NumberArity, Value, ValueType, VariantType,
};
pub use formats::{
    decode_line, parse_header, AlleleRecord, DecodeOptions, DecodeStats, HeaderContext,
    HeaderParser, LineDecode, VcfDecoder,
};
