//! FORMAT and sample column decoding
//!
//! Each sample column is split by the FORMAT key order and distributed over
//! the ALT alleles of the locus:
//!
//! - `GT` is resolved to allele strings (REF, then ALTs as written)
//! - `AD` and `Number=R` fields become REF/ALT pairs keyed by the allele's
//!   own normalized strings
//! - `Number=A` fields go to their ALT only
//! - everything else is copied to every ALT

use crate::core::allele::NormalizedAllele;
use crate::core::value::{coerce_list, coerce_scalar, MISSING};
use crate::core::{DecodeWarning, NumberArity, Value, ValueType};
use crate::formats::header::HeaderContext;
use log::trace;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// FORMAT key of the genotype
pub const GT_KEY: &str = "GT";

/// FORMAT key of allelic depths; always treated as `Number=R`
pub const AD_KEY: &str = "AD";

/// A parsed `GT` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Genotype {
    /// Allele indices; `None` for `.`
    pub indices: Vec<Option<usize>>,
    /// `|` when phased, `/` otherwise
    pub separator: char,
}

impl Genotype {
    /// Parse a `GT` token such as `0/1`, `1|2`, `./.` or `1`
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let separator = if raw.contains('|') { '|' } else { '/' };
        let indices = raw
            .split(['/', '|'])
            .map(|token| token.parse::<usize>().ok())
            .collect();
        Some(Self { indices, separator })
    }

    /// True only when every index is known and is the reference
    pub fn is_homozygous_ref(&self) -> bool {
        !self.indices.is_empty() && self.indices.iter().all(|index| *index == Some(0))
    }

    /// Render with allele strings; unknown or out-of-range indices are `.`
    pub fn render(&self, alleles: &[&str]) -> String {
        let parts: Vec<&str> = self
            .indices
            .iter()
            .map(|index| match index {
                Some(i) => alleles.get(*i).copied().unwrap_or(MISSING),
                None => MISSING,
            })
            .collect();
        parts.join(&self.separator.to_string())
    }
}

/// REF/ALT contributions of a `Number=R` field for one ALT allele
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleValues {
    pub ref_allele: String,
    pub ref_value: Option<Value>,
    pub alt_allele: String,
    pub alt_value: Option<Value>,
}

impl Serialize for AlleleValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(&self.ref_allele, &self.ref_value)?;
        map.serialize_entry(&self.alt_allele, &self.alt_value)?;
        map.end()
    }
}

/// A decoded FORMAT value for one sample and one ALT allele
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FormatValue {
    Value(Value),
    Alleles(AlleleValues),
}

/// One sample's data as seen from one ALT allele
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleAlleleData {
    pub sample: String,
    /// `GT` as written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt: Option<String>,
    /// `GT` with indices replaced by allele strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genotype: Option<String>,
    pub is_homozygous_ref: bool,
    pub fields: BTreeMap<String, FormatValue>,
    /// Allele string (as written) -> depth, from `AD`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allele2readcount: Option<BTreeMap<String, i64>>,
}

/// Decoded sample columns of one locus
#[derive(Debug, Clone, Default)]
pub struct FormatDecode {
    /// One list per ALT allele, samples in column order
    pub per_allele: Vec<Vec<SampleAlleleData>>,
    /// FORMAT keys without a `##FORMAT` declaration
    pub unknown_keys: Vec<String>,
    pub warnings: Vec<DecodeWarning>,
}

/// Field shape after schema lookup
#[derive(Debug, Clone, Copy)]
enum Shape {
    PerAllele,
    PerAltAllele,
    Shared,
}

/// Decode the FORMAT column and the sample columns of one locus.
///
/// `ref_allele` and each allele's `original` are the strings as written;
/// sample names come from the header, extra columns are ignored.
pub fn decode_samples(
    format: &str,
    sample_columns: &[&str],
    header: &HeaderContext,
    ref_allele: &str,
    alleles: &[NormalizedAllele],
) -> FormatDecode {
    let mut decoded = FormatDecode {
        per_allele: vec![Vec::new(); alleles.len()],
        ..Default::default()
    };
    if format.is_empty() || format == MISSING {
        return decoded;
    }

    let keys: Vec<&str> = format.split(':').collect();
    let shapes: Vec<(Shape, ValueType)> = keys
        .iter()
        .map(|key| field_shape(key, header, &mut decoded))
        .collect();

    let mut locus_alleles: Vec<&str> = Vec::with_capacity(alleles.len() + 1);
    locus_alleles.push(ref_allele);
    locus_alleles.extend(alleles.iter().map(|a| a.original.as_str()));

    if sample_columns.len() > header.samples.len() {
        trace!(
            "{} sample columns but {} sample names; extra columns ignored",
            sample_columns.len(),
            header.samples.len()
        );
    }

    for (sample, column) in header.samples.iter().zip(sample_columns) {
        let tokens: Vec<&str> = column.split(':').collect();
        if tokens.iter().all(|t| is_missing_token(t)) {
            continue;
        }

        let mut per_allele: Vec<SampleAlleleData> = alleles
            .iter()
            .map(|_| SampleAlleleData {
                sample: sample.name.clone(),
                gt: None,
                genotype: None,
                is_homozygous_ref: false,
                fields: BTreeMap::new(),
                allele2readcount: None,
            })
            .collect();

        for ((key, (shape, value_type)), token) in keys.iter().zip(&shapes).zip(&tokens) {
            if *key == GT_KEY {
                apply_genotype(&mut per_allele, token, &locus_alleles);
                continue;
            }
            match shape {
                Shape::PerAllele => {
                    apply_per_allele(&mut per_allele, key, token, *value_type, alleles);
                    if *key == AD_KEY {
                        apply_read_counts(&mut per_allele, token, &locus_alleles);
                    }
                }
                Shape::PerAltAllele => {
                    for (data, part) in per_allele.iter_mut().zip(token.split(',')) {
                        if let Some(value) = coerce_scalar(part, *value_type) {
                            data.fields
                                .insert(key.to_string(), FormatValue::Value(value));
                        }
                    }
                }
                Shape::Shared => {
                    if let Some(value) = coerce_list(token, *value_type) {
                        for data in per_allele.iter_mut() {
                            data.fields
                                .insert(key.to_string(), FormatValue::Value(value.clone()));
                        }
                    }
                }
            }
        }

        for (slot, data) in decoded.per_allele.iter_mut().zip(per_allele) {
            slot.push(data);
        }
    }

    decoded
}

/// `.`, `./.`, `.|.` or `.,.`: nothing recorded
fn is_missing_token(token: &str) -> bool {
    token.split(['/', '|', ',']).all(|part| part.is_empty() || part == MISSING)
}

fn field_shape(key: &str, header: &HeaderContext, decoded: &mut FormatDecode) -> (Shape, ValueType) {
    if key == GT_KEY {
        return (Shape::Shared, ValueType::String);
    }
    match header.format_schema(key) {
        Some(schema) => {
            let shape = match schema.number {
                _ if key == AD_KEY => Shape::PerAllele,
                NumberArity::PerAllele => Shape::PerAllele,
                NumberArity::PerAltAllele => Shape::PerAltAllele,
                _ => Shape::Shared,
            };
            (shape, schema.value_type)
        }
        None => {
            if !decoded.unknown_keys.iter().any(|k| k == key) {
                decoded.unknown_keys.push(key.to_string());
                decoded
                    .warnings
                    .push(DecodeWarning::UnknownFormatKey(key.to_string()));
            }
            if key == AD_KEY {
                (Shape::PerAllele, ValueType::Integer)
            } else {
                (Shape::Shared, ValueType::String)
            }
        }
    }
}

fn apply_genotype(per_allele: &mut [SampleAlleleData], token: &str, locus_alleles: &[&str]) {
    let genotype = match Genotype::parse(token) {
        Some(genotype) => genotype,
        None => return,
    };
    let rendered = genotype.render(locus_alleles);
    let in_range = genotype
        .indices
        .iter()
        .all(|index| index.map_or(true, |i| i < locus_alleles.len()));
    let hom_ref = in_range && genotype.is_homozygous_ref();

    for data in per_allele.iter_mut() {
        data.gt = Some(token.to_string());
        data.genotype = Some(rendered.clone());
        data.is_homozygous_ref = hom_ref;
    }
}

fn apply_per_allele(
    per_allele: &mut [SampleAlleleData],
    key: &str,
    token: &str,
    value_type: ValueType,
    alleles: &[NormalizedAllele],
) {
    if token == MISSING {
        return;
    }
    let parts: Vec<&str> = token.split(',').collect();
    let ref_value = parts.first().and_then(|p| coerce_scalar(p, value_type));

    for (i, (data, allele)) in per_allele.iter_mut().zip(alleles).enumerate() {
        let alt_value = parts.get(i + 1).and_then(|p| coerce_scalar(p, value_type));
        if ref_value.is_none() && alt_value.is_none() {
            continue;
        }
        data.fields.insert(
            key.to_string(),
            FormatValue::Alleles(AlleleValues {
                ref_allele: allele.ref_allele.clone(),
                ref_value: ref_value.clone(),
                alt_allele: allele.alt.clone(),
                alt_value,
            }),
        );
    }
}

fn apply_read_counts(per_allele: &mut [SampleAlleleData], token: &str, locus_alleles: &[&str]) {
    let counts: BTreeMap<String, i64> = locus_alleles
        .iter()
        .zip(token.split(','))
        .filter_map(|(allele, part)| part.parse::<i64>().ok().map(|n| (allele.to_string(), n)))
        .collect();
    if counts.is_empty() {
        return;
    }
    for data in per_allele.iter_mut() {
        data.allele2readcount = Some(counts.clone());
    }
}
