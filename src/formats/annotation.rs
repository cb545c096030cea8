//! VEP `CSQ` and snpEff `ANN` annotations
//!
//! Each INFO value holds comma-separated sub-records whose pipe-delimited
//! fields follow the column list declared in the meta header. Sub-records
//! are attributed to ALT alleles, classified through the severity table,
//! and ranked to pick one consequence per allele.

use crate::core::mclass::{self, DatatypeTag, MutationClass};
use serde::Serialize;
use std::collections::BTreeMap;

/// Which annotator produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    /// Ensembl VEP
    Csq,
    /// snpEff
    Ann,
}

impl AnnotationKind {
    /// INFO key carrying this annotation
    pub fn key(&self) -> &'static str {
        match self {
            AnnotationKind::Csq => "CSQ",
            AnnotationKind::Ann => "ANN",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "CSQ" => Some(AnnotationKind::Csq),
            "ANN" => Some(AnnotationKind::Ann),
            _ => None,
        }
    }

    fn consequence_column(&self) -> &'static str {
        match self {
            AnnotationKind::Csq => "Consequence",
            AnnotationKind::Ann => "Annotation",
        }
    }
}

/// One parsed annotation sub-record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationEntry {
    /// Non-empty fields by column name
    pub fields: BTreeMap<String, String>,
    pub gene: Option<String>,
    /// Transcript id without version suffix
    pub isoform: Option<String>,
    pub consequences: Vec<String>,
    /// Severity rank, 1 is most severe
    pub rank: usize,
    pub class: MutationClass,
    pub dt: DatatypeTag,
    pub mname: Option<String>,
}

/// Drop a version suffix: `NM_001.3` -> `NM_001`
pub fn strip_version(id: &str) -> &str {
    id.split('.').next().unwrap_or(id)
}

fn percent_decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Attribute an annotator's `Allele` to one of the locus ALT alleles, by
/// index into `alt_originals` (ALT strings as written, untrimmed).
///
/// Tried in order: exact match; `-` when the locus has a single ALT;
/// the ALT with its leading padding base removed.
pub fn match_allele(annotated: &str, alt_originals: &[&str]) -> Option<usize> {
    if let Some(i) = alt_originals.iter().position(|alt| *alt == annotated) {
        return Some(i);
    }
    if annotated == "-" {
        return if alt_originals.len() == 1 { Some(0) } else { None };
    }
    alt_originals
        .iter()
        .position(|alt| alt.len() > 1 && alt.get(1..) == Some(annotated))
}

/// Parse one CSQ/ANN value into per-ALT entry lists (one list per ALT,
/// in ALT order). Sub-records whose allele matches no ALT are dropped.
pub fn parse_annotations(
    kind: AnnotationKind,
    raw: &str,
    columns: &[String],
    alt_originals: &[&str],
) -> Vec<Vec<AnnotationEntry>> {
    let mut per_allele: Vec<Vec<AnnotationEntry>> = vec![Vec::new(); alt_originals.len()];
    if raw == "." {
        return per_allele;
    }

    for sub_record in raw.split(',') {
        let fields: BTreeMap<String, String> = columns
            .iter()
            .zip(sub_record.split('|'))
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, value)| (column.clone(), value.to_string()))
            .collect();

        let allele = match fields.get("Allele") {
            Some(allele) => allele,
            None => continue,
        };
        let index = match match_allele(allele, alt_originals) {
            Some(i) => i,
            None => {
                log::trace!("{} sub-record for unmatched allele {}", kind.key(), allele);
                continue;
            }
        };

        per_allele[index].push(build_entry(kind, fields));
    }

    per_allele
}

fn build_entry(kind: AnnotationKind, fields: BTreeMap<String, String>) -> AnnotationEntry {
    let consequences: Vec<String> = fields
        .get(kind.consequence_column())
        .map(|terms| terms.split('&').map(str::to_string).collect())
        .unwrap_or_default();

    let consequence = mclass::classify(&consequences);

    let (gene, isoform, mname) = match kind {
        AnnotationKind::Csq => csq_identity(&fields),
        AnnotationKind::Ann => ann_identity(&fields),
    };

    AnnotationEntry {
        gene,
        isoform,
        consequences,
        rank: consequence.rank,
        class: consequence.class,
        dt: consequence.dt,
        mname,
        fields,
    }
}

type Identity = (Option<String>, Option<String>, Option<String>);

fn csq_identity(fields: &BTreeMap<String, String>) -> Identity {
    let gene = fields.get("SYMBOL").or_else(|| fields.get("Gene")).cloned();

    let isoform = match (fields.get("Feature_type"), fields.get("Feature")) {
        (Some(feature_type), Some(feature)) if feature_type == "Transcript" => {
            Some(strip_version(feature).to_string())
        }
        _ => gene.clone(),
    };

    let mname = if let Some(hgvsp) = fields.get("HGVSp") {
        let change = hgvsp.split_once(':').map(|(_, c)| c).unwrap_or(hgvsp);
        Some(percent_decode(change.strip_prefix("p.").unwrap_or(change)))
    } else if let (Some(position), Some(amino_acids)) =
        (fields.get("Protein_position"), fields.get("Amino_acids"))
    {
        Some(percent_decode(&format!("{}{}", position, amino_acids)))
    } else if let Some(hgvsc) = fields.get("HGVSc") {
        Some(hgvsc.split_once(':').map(|(_, c)| c).unwrap_or(hgvsc).to_string())
    } else {
        fields.get("Existing_variation").cloned()
    };

    (gene, isoform, mname)
}

fn ann_identity(fields: &BTreeMap<String, String>) -> Identity {
    let gene = fields
        .get("Gene_Name")
        .or_else(|| fields.get("Gene_ID"))
        .cloned();
    let isoform = fields
        .get("Feature_ID")
        .map(|feature| strip_version(feature).to_string());
    let mname = fields
        .get("HGVS.p")
        .map(|p| percent_decode(p.strip_prefix("p.").unwrap_or(p)))
        .or_else(|| fields.get("HGVS.c").cloned());

    (gene, isoform, mname)
}

fn most_severe<'a, I>(entries: I) -> Option<&'a AnnotationEntry>
where
    I: Iterator<Item = &'a AnnotationEntry>,
{
    entries.fold(None, |best: Option<&AnnotationEntry>, entry| match best {
        Some(b) if b.rank <= entry.rank => Some(b),
        _ => Some(entry),
    })
}

/// Pick the best entry for one allele.
///
/// With a preferred isoform, only entries of that isoform compete (versions
/// ignored); if none match, `genomic_fallback` widens the choice to all
/// entries, otherwise nothing is chosen. Without a preference the most
/// severe entry overall wins. Ties keep the earliest entry.
pub fn select_best<'a>(
    entries: &'a [AnnotationEntry],
    preferred_isoform: Option<&str>,
    genomic_fallback: bool,
) -> Option<&'a AnnotationEntry> {
    match preferred_isoform {
        Some(isoform) => {
            let isoform = strip_version(isoform);
            most_severe(
                entries
                    .iter()
                    .filter(|e| e.isoform.as_deref() == Some(isoform)),
            )
            .or_else(|| {
                if genomic_fallback {
                    most_severe(entries.iter())
                } else {
                    None
                }
            })
        }
        None => most_severe(entries.iter()),
    }
}

/// Like [`select_best`], but a winner of the `noncoding` class is discarded
/// so the caller falls back to the allele-type class.
pub fn resolve_best<'a>(
    entries: &'a [AnnotationEntry],
    preferred_isoform: Option<&str>,
    genomic_fallback: bool,
) -> Option<&'a AnnotationEntry> {
    select_best(entries, preferred_isoform, genomic_fallback)
        .filter(|entry| entry.class != MutationClass::Noncoding)
}
