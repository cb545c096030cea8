//! INFO column decoding
//!
//! Splits the INFO column into keys and values, applies each key's schema,
//! and separates locus-level values from per-ALT (`Number=A`) values.
//! `CSQ` and `ANN` are handed to the annotation parser.
//!
//! `Number=R` INFO fields have no slot for the reference value and are
//! kept as plain locus-level lists.

use crate::core::value::{coerce_list, coerce_scalar};
use crate::core::{DecodeWarning, NumberArity, Value, ValueType};
use crate::formats::annotation::{parse_annotations, AnnotationEntry, AnnotationKind};
use crate::formats::header::HeaderContext;
use std::collections::BTreeMap;

/// One `key` or `key=value` item of the INFO column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoEntry<'a> {
    pub key: &'a str,
    /// `None` for a bare key (flag)
    pub value: Option<&'a str>,
}

/// Split an INFO column into items.
///
/// Every `;` separates items, quotes included; the first `=` of an item
/// separates key from value, later ones belong to the value.
pub fn tokenize_info(raw: &str) -> Vec<InfoEntry<'_>> {
    if raw.is_empty() || raw == "." {
        return Vec::new();
    }

    raw.split(';')
        .filter_map(|item| {
            let entry = match item.split_once('=') {
                Some((key, value)) => InfoEntry {
                    key,
                    value: Some(value),
                },
                None => InfoEntry {
                    key: item,
                    value: None,
                },
            };
            if entry.key.is_empty() {
                None
            } else {
                Some(entry)
            }
        })
        .collect()
}

/// Decoded INFO column of one locus
#[derive(Debug, Clone, Default)]
pub struct InfoDecode {
    /// Values shared by every ALT allele
    pub locus: BTreeMap<String, Value>,
    /// `Number=A` values, one map per ALT allele
    pub per_allele: Vec<BTreeMap<String, Value>>,
    /// CSQ entries per ALT allele
    pub csq: Vec<Vec<AnnotationEntry>>,
    /// ANN entries per ALT allele
    pub ann: Vec<Vec<AnnotationEntry>>,
    /// Keys without an `##INFO` declaration, first occurrence order
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<DecodeWarning>,
}

/// Decode an INFO column for a locus whose ALT alleles (as written) are
/// `alt_originals`.
pub fn decode_info(raw: &str, header: &HeaderContext, alt_originals: &[&str]) -> InfoDecode {
    let alt_count = alt_originals.len();
    let mut decoded = InfoDecode {
        per_allele: vec![BTreeMap::new(); alt_count],
        csq: vec![Vec::new(); alt_count],
        ann: vec![Vec::new(); alt_count],
        ..Default::default()
    };

    for InfoEntry { key, value } in tokenize_info(raw) {
        if let Some(kind) = AnnotationKind::from_key(key) {
            decode_annotation(&mut decoded, kind, value, header, alt_originals);
            continue;
        }

        let schema = match header.info_schema(key) {
            Some(schema) => schema,
            None => {
                if !decoded.unknown_keys.iter().any(|k| k == key) {
                    decoded.unknown_keys.push(key.to_string());
                    decoded
                        .warnings
                        .push(DecodeWarning::UnknownInfoKey(key.to_string()));
                }
                let verbatim = match value {
                    Some(v) => Value::String(v.to_string()),
                    None => Value::Flag(key.to_string()),
                };
                decoded.locus.insert(key.to_string(), verbatim);
                continue;
            }
        };

        let raw_value = match value {
            Some(v) if schema.value_type != ValueType::Flag => v,
            _ => {
                decoded
                    .locus
                    .insert(key.to_string(), Value::Flag(key.to_string()));
                continue;
            }
        };

        match schema.number {
            NumberArity::Fixed(0) => {
                decoded
                    .locus
                    .insert(key.to_string(), Value::Flag(key.to_string()));
            }
            NumberArity::PerAltAllele => {
                for (i, token) in raw_value.split(',').take(alt_count).enumerate() {
                    if let Some(v) = coerce_scalar(token, schema.value_type) {
                        decoded.per_allele[i].insert(key.to_string(), v);
                    }
                }
            }
            NumberArity::PerAllele
            | NumberArity::PerGenotype
            | NumberArity::Fixed(_)
            | NumberArity::Unbounded => {
                if let Some(v) = coerce_list(raw_value, schema.value_type) {
                    decoded.locus.insert(key.to_string(), v);
                }
            }
        }
    }

    decoded
}

fn decode_annotation(
    decoded: &mut InfoDecode,
    kind: AnnotationKind,
    value: Option<&str>,
    header: &HeaderContext,
    alt_originals: &[&str],
) {
    let raw = match value {
        Some(v) => v,
        None => return,
    };
    let columns = match kind {
        AnnotationKind::Csq => header.csq_columns.as_ref(),
        AnnotationKind::Ann => header.ann_columns.as_ref(),
    };

    match columns {
        Some(columns) => {
            let per_allele = parse_annotations(kind, raw, columns, alt_originals);
            let target = match kind {
                AnnotationKind::Csq => &mut decoded.csq,
                AnnotationKind::Ann => &mut decoded.ann,
            };
            for (slot, entries) in target.iter_mut().zip(per_allele) {
                slot.extend(entries);
            }
        }
        None => {
            decoded
                .locus
                .insert(kind.key().to_string(), Value::String(raw.to_string()));
            decoded
                .warnings
                .push(DecodeWarning::AnnotationHeaderUnavailable(kind.key().to_string()));
        }
    }
}
