//! VCF decoders
//!
//! Meta-header parsing, INFO/FORMAT decoding, CSQ/ANN annotations and the
//! per-allele record splitter.

pub mod annotation;
pub mod header;
pub mod info;
pub mod sample;
pub mod vcf;

pub use annotation::{parse_annotations, resolve_best, select_best, AnnotationEntry, AnnotationKind};
pub use header::{parse_header, HeaderBuilder, HeaderContext, HeaderParser, ParsedHeader, SampleRef};
pub use info::{decode_info, InfoDecode};
pub use sample::{decode_samples, AlleleValues, FormatDecode, FormatValue, Genotype, SampleAlleleData};
pub use vcf::{decode_line, AlleleRecord, DecodeOptions, DecodeStats, LineDecode, RawLocus, VcfDecoder, VcfRecordView};
