//! Allele normalization
//!
//! Trims bases shared by REF and ALT and shifts the position accordingly,
//! then types the allele from the trimmed lengths.

use serde::Serialize;
use std::fmt;

/// Allele kind derived from the normalized REF/ALT pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    Snv,
    Mnv,
    Insertion,
    Deletion,
    SymbolicAllele,
    NonStandard,
}

impl VariantType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::Snv => "snv",
            VariantType::Mnv => "mnv",
            VariantType::Insertion => "insertion",
            VariantType::Deletion => "deletion",
            VariantType::SymbolicAllele => "symbolic",
            VariantType::NonStandard => "nonstandard",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check if a byte is a valid nucleotide (standard or IUPAC, either case)
#[inline]
pub fn is_dna_base(base: u8) -> bool {
    matches!(
        base.to_ascii_uppercase(),
        b'A' | b'T' | b'G' | b'C' | b'U' | b'R' | b'Y' | b'S' | b'W' | b'K' | b'M' | b'B'
            | b'V' | b'D' | b'H' | b'N'
    )
}

/// Check if every byte of `seq` is a nucleotide
pub fn is_dna(seq: &str) -> bool {
    seq.bytes().all(is_dna_base)
}

/// Trim shared trailing bases, then shared leading bases.
///
/// Both loops stop as soon as either side is down to one base, so the
/// padding base of an indel survives. Suffix trimming always runs first;
/// swapping the order changes the result for repeats.
///
/// ```
/// use vcf_decode::core::allele::normalize;
///
/// assert_eq!(normalize(100, "ATG", "ATC"), (102, "G".to_string(), "C".to_string()));
/// assert_eq!(normalize(100, "A", "G"), (100, "A".to_string(), "G".to_string()));
/// ```
pub fn normalize(pos: u64, ref_allele: &str, alt: &str) -> (u64, String, String) {
    // compared per char so a trim never stops inside a multi-byte character
    let r: Vec<char> = ref_allele.chars().collect();
    let a: Vec<char> = alt.chars().collect();

    let mut r_end = r.len();
    let mut a_end = a.len();
    while r_end > 1 && a_end > 1 && r[r_end - 1] == a[a_end - 1] {
        r_end -= 1;
        a_end -= 1;
    }

    let mut start = 0;
    while r_end - start > 1 && a_end - start > 1 && r[start] == a[start] {
        start += 1;
    }

    (
        pos.saturating_add(start as u64),
        r[start..r_end].iter().collect(),
        a[start..a_end].iter().collect(),
    )
}

/// Type a normalized, non-symbolic REF/ALT pair
pub fn variant_type(ref_allele: &str, alt: &str) -> VariantType {
    if !is_dna(alt) || !is_dna(ref_allele) {
        return VariantType::NonStandard;
    }
    match (ref_allele.len(), alt.len()) {
        (1, 1) => VariantType::Snv,
        (r, a) if r == a => VariantType::Mnv,
        (r, a) if a > r => VariantType::Insertion,
        _ => VariantType::Deletion,
    }
}

/// One ALT allele of a locus after normalization
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAllele {
    /// ALT as written in the data line
    pub original: String,
    /// 0-based position after trimming
    pub pos: u64,
    pub ref_allele: String,
    /// Trimmed ALT; the bare name for symbolic alleles, empty for `.`
    pub alt: String,
    pub variant_type: VariantType,
    /// `false` for a `<...>` allele that is not a well-formed symbolic name
    pub valid: bool,
}

impl NormalizedAllele {
    pub fn is_symbolic(&self) -> bool {
        self.variant_type == VariantType::SymbolicAllele
    }

    /// gVCF reference-block placeholder
    pub fn is_non_ref(&self) -> bool {
        self.is_symbolic() && self.alt == "NON_REF"
    }
}

/// Extract `NAME` from `<NAME>`; `None` when the brackets are malformed
fn symbolic_name(alt: &str) -> Option<&str> {
    let inner = alt.strip_prefix('<')?.strip_suffix('>')?;
    if inner.is_empty() || inner.contains('<') || inner.contains('>') {
        None
    } else {
        Some(inner)
    }
}

/// Normalize one ALT allele against the locus REF.
///
/// Symbolic alleles keep their name and position untouched; a missing
/// allele (`.`) is a deletion with an empty ALT and is never trimmed.
pub fn normalize_allele(pos: u64, ref_allele: &str, alt: &str) -> NormalizedAllele {
    if alt.starts_with('<') {
        let (name, valid) = match symbolic_name(alt) {
            Some(name) => (name.to_string(), true),
            None => (alt.to_string(), false),
        };
        return NormalizedAllele {
            original: alt.to_string(),
            pos,
            ref_allele: ref_allele.to_string(),
            alt: name,
            variant_type: VariantType::SymbolicAllele,
            valid,
        };
    }

    if alt == "." {
        return NormalizedAllele {
            original: alt.to_string(),
            pos,
            ref_allele: ref_allele.to_string(),
            alt: String::new(),
            variant_type: VariantType::Deletion,
            valid: true,
        };
    }

    let (new_pos, new_ref, new_alt) = normalize(pos, ref_allele, alt);
    let variant_type = variant_type(&new_ref, &new_alt);
    NormalizedAllele {
        original: alt.to_string(),
        pos: new_pos,
        ref_allele: new_ref,
        alt: new_alt,
        variant_type,
        valid: true,
    }
}
