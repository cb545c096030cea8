//! Mutation classes and consequence severity
//!
//! Class codes are the keys of the external class/color/label registry.
//! The severity table ranks Sequence Ontology consequence terms, most
//! severe first; a term's rank is its 1-based position in the table.

use crate::core::allele::VariantType;
use once_cell::sync::Lazy;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Internal mutation class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationClass {
    Missense,
    Exon,
    Frameshift,
    Nonsense,
    Silent,
    ProteinDel,
    ProteinIns,
    SpliceRegion,
    Splice,
    Intron,
    Utr3,
    Utr5,
    Noncoding,
    Nonstandard,
    Snv,
    Mnv,
    Insertion,
    Deletion,
}

impl MutationClass {
    /// Registry key for this class
    pub fn code(&self) -> &'static str {
        match self {
            MutationClass::Missense => "M",
            MutationClass::Exon => "E",
            MutationClass::Frameshift => "F",
            MutationClass::Nonsense => "N",
            MutationClass::Silent => "S",
            MutationClass::ProteinDel => "D",
            MutationClass::ProteinIns => "I",
            MutationClass::SpliceRegion => "P",
            MutationClass::Splice => "L",
            MutationClass::Intron => "Intron",
            MutationClass::Utr3 => "Utr3",
            MutationClass::Utr5 => "Utr5",
            MutationClass::Noncoding => "noncoding",
            MutationClass::Nonstandard => "X",
            MutationClass::Snv => "snv",
            MutationClass::Mnv => "mnv",
            MutationClass::Insertion => "insertion",
            MutationClass::Deletion => "deletion",
        }
    }

    /// Class used when no annotation resolved one
    pub fn from_variant_type(variant_type: VariantType) -> Self {
        match variant_type {
            VariantType::Snv => MutationClass::Snv,
            VariantType::Mnv => MutationClass::Mnv,
            VariantType::Insertion => MutationClass::Insertion,
            VariantType::Deletion => MutationClass::Deletion,
            VariantType::SymbolicAllele | VariantType::NonStandard => MutationClass::Nonstandard,
        }
    }
}

impl fmt::Display for MutationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for MutationClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Datatype tag of the external registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatatypeTag {
    SnvIndel,
    Deletion,
}

impl DatatypeTag {
    pub fn code(&self) -> u8 {
        match self {
            DatatypeTag::SnvIndel => 1,
            DatatypeTag::Deletion => 7,
        }
    }
}

impl Serialize for DatatypeTag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

use DatatypeTag::{Deletion as DtDel, SnvIndel as Dt};
use MutationClass::*;

/// Consequence terms, most severe first
pub static SEVERITY_TABLE: &[(&str, DatatypeTag, MutationClass)] = &[
    ("transcript_ablation", DtDel, Deletion),
    ("exon_loss_variant", Dt, ProteinDel),
    ("splice_acceptor_variant", Dt, Splice),
    ("splice_donor_variant", Dt, Splice),
    ("stop_gained", Dt, Nonsense),
    ("frameshift_variant", Dt, Frameshift),
    ("stop_lost", Dt, Nonsense),
    ("start_lost", Dt, Nonsense),
    ("transcript_amplification", Dt, Nonstandard),
    ("inframe_insertion", Dt, ProteinIns),
    ("conservative_inframe_insertion", Dt, ProteinIns),
    ("disruptive_inframe_insertion", Dt, ProteinIns),
    ("inframe_deletion", Dt, ProteinDel),
    ("conservative_inframe_deletion", Dt, ProteinDel),
    ("disruptive_inframe_deletion", Dt, ProteinDel),
    ("missense_variant", Dt, Missense),
    ("rare_amino_acid_variant", Dt, Missense),
    ("protein_altering_variant", Dt, Nonstandard),
    ("splice_region_variant", Dt, SpliceRegion),
    ("incomplete_terminal_codon_variant", Dt, Nonstandard),
    ("start_retained_variant", Dt, Silent),
    ("stop_retained_variant", Dt, Silent),
    ("synonymous_variant", Dt, Silent),
    ("coding_sequence_variant", Dt, Nonstandard),
    ("mature_mirna_variant", Dt, Exon),
    ("5_prime_utr_premature_start_codon_gain_variant", Dt, Utr5),
    ("5_prime_utr_variant", Dt, Utr5),
    ("3_prime_utr_variant", Dt, Utr3),
    ("non_coding_transcript_exon_variant", Dt, Exon),
    ("exon_variant", Dt, Exon),
    ("intron_variant", Dt, Intron),
    ("nmd_transcript_variant", Dt, Noncoding),
    ("non_coding_transcript_variant", Dt, Exon),
    ("upstream_gene_variant", Dt, Noncoding),
    ("downstream_gene_variant", Dt, Noncoding),
    ("tfbs_ablation", Dt, Noncoding),
    ("tfbs_amplification", Dt, Noncoding),
    ("tf_binding_site_variant", Dt, Noncoding),
    ("regulatory_region_ablation", Dt, Noncoding),
    ("regulatory_region_amplification", Dt, Noncoding),
    ("feature_elongation", Dt, Noncoding),
    ("regulatory_region_variant", Dt, Noncoding),
    ("feature_truncation", Dt, Noncoding),
    ("intergenic_variant", Dt, Noncoding),
    ("intergenic_region", Dt, Noncoding),
];

/// Lowercased term -> index into [`SEVERITY_TABLE`]
static TERM_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    let mut index = HashMap::with_capacity(SEVERITY_TABLE.len());
    for (i, (term, _, _)) in SEVERITY_TABLE.iter().enumerate() {
        let previous = index.insert(*term, i);
        debug_assert!(previous.is_none(), "duplicate consequence term: {}", term);
    }
    index
});

/// Result of classifying a consequence term set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Consequence {
    pub dt: DatatypeTag,
    pub class: MutationClass,
    /// 1 is most severe
    pub rank: usize,
}

/// Rank assigned to term sets that match nothing in the table
pub fn unranked() -> usize {
    SEVERITY_TABLE.len() + 1
}

/// Classify a set of consequence terms by its most severe known term.
/// Unknown or empty sets map to the nonstandard class; this never fails.
pub fn classify<I, S>(terms: I) -> Consequence
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let best = terms
        .into_iter()
        .filter_map(|term| {
            let lowered = term.as_ref().trim().to_ascii_lowercase();
            TERM_INDEX.get(lowered.as_str()).copied()
        })
        .min();

    match best {
        Some(i) => {
            let (_, dt, class) = SEVERITY_TABLE[i];
            Consequence {
                dt,
                class,
                rank: i + 1,
            }
        }
        None => Consequence {
            dt: DatatypeTag::SnvIndel,
            class: MutationClass::Nonstandard,
            rank: unranked(),
        },
    }
}
