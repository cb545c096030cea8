//! Property-based tests for CSQ/ANN ranking
//!
//! The most severe consequence wins, the table is total, and a noncoding
//! winner is discarded so the allele-type class applies.

use proptest::prelude::*;
use vcf_decode::core::mclass::{classify, unranked, SEVERITY_TABLE};
use vcf_decode::formats::annotation::{
    match_allele, parse_annotations, resolve_best, select_best, AnnotationKind,
};
use vcf_decode::MutationClass;

fn csq_columns() -> Vec<String> {
    ["Allele", "Consequence", "SYMBOL", "Feature_type", "Feature"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Generate a term from the severity table
fn arb_known_term() -> impl Strategy<Value = (usize, &'static str)> {
    (0..SEVERITY_TABLE.len()).prop_map(|i| (i, SEVERITY_TABLE[i].0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// A term set ranks as its most severe member
    #[test]
    fn prop_classify_takes_minimum(terms in prop::collection::vec(arb_known_term(), 1..5)) {
        let best = terms.iter().map(|(i, _)| *i).min().unwrap();
        let names: Vec<&str> = terms.iter().map(|(_, t)| *t).collect();
        let c = classify(&names);
        prop_assert_eq!(c.rank, best + 1);
        prop_assert_eq!(c.class, SEVERITY_TABLE[best].2);
    }

    /// Unknown terms never fail and never outrank a known term
    #[test]
    fn prop_classify_total(term in "[a-z_]{1,20}") {
        let c = classify([term.as_str()]);
        prop_assert!(c.rank <= unranked());
        if c.rank == unranked() {
            prop_assert_eq!(c.class, MutationClass::Nonstandard);
        }
    }

    /// The best entry is the lowest rank among the allele's sub-records
    #[test]
    fn prop_best_entry_is_most_severe(picks in prop::collection::vec(arb_known_term(), 1..6)) {
        let raw = picks
            .iter()
            .enumerate()
            .map(|(n, (_, term))| format!("T|{}|GENE|Transcript|NM_{}", term, n))
            .collect::<Vec<_>>()
            .join(",");
        let per_allele = parse_annotations(AnnotationKind::Csq, &raw, &csq_columns(), &["T"]);
        prop_assert_eq!(per_allele[0].len(), picks.len());

        let best = select_best(&per_allele[0], None, false).unwrap();
        let min = picks.iter().map(|(i, _)| *i).min().unwrap();
        prop_assert_eq!(best.rank, min + 1);
    }
}

#[test]
fn test_missense_beats_synonymous() {
    let raw = "T|synonymous_variant|TP53|Transcript|NM_1,T|missense_variant|TP53|Transcript|NM_2";
    let per_allele = parse_annotations(AnnotationKind::Csq, raw, &csq_columns(), &["T"]);
    let best = select_best(&per_allele[0], None, false).unwrap();
    assert_eq!(best.class, MutationClass::Missense);
    assert_eq!(best.isoform.as_deref(), Some("NM_2"));
}

#[test]
fn test_noncoding_discarded() {
    let raw = "T|downstream_gene_variant|TP53|Transcript|NM_1";
    let per_allele = parse_annotations(AnnotationKind::Csq, raw, &csq_columns(), &["T"]);
    assert_eq!(
        select_best(&per_allele[0], None, false).map(|e| e.class),
        Some(MutationClass::Noncoding)
    );
    assert!(resolve_best(&per_allele[0], None, false).is_none());
}

#[test]
fn test_allele_matching_order() {
    // exact match wins over the padding-base rule
    assert_eq!(match_allele("AT", &["AT", "AAT"]), Some(0));
    // insertion shorthand
    assert_eq!(match_allele("TT", &["G", "ATT"]), Some(1));
    // deletion shorthand needs a single ALT
    assert_eq!(match_allele("-", &["A"]), Some(0));
    assert_eq!(match_allele("-", &["A", "C"]), None);
}

#[test]
fn test_unmatched_sub_record_dropped() {
    let raw = "G|missense_variant|TP53|Transcript|NM_1";
    let per_allele = parse_annotations(AnnotationKind::Csq, raw, &csq_columns(), &["T"]);
    assert!(per_allele[0].is_empty());
}

#[test]
fn test_preferred_isoform_without_fallback() {
    let raw = "T|missense_variant|TP53|Transcript|NM_1.2,T|synonymous_variant|TP53|Transcript|NM_2.1";
    let per_allele = parse_annotations(AnnotationKind::Csq, raw, &csq_columns(), &["T"]);

    let best = select_best(&per_allele[0], Some("NM_2"), false).unwrap();
    assert_eq!(best.class, MutationClass::Silent);
    assert!(select_best(&per_allele[0], Some("NM_3"), false).is_none());
    assert_eq!(
        select_best(&per_allele[0], Some("NM_3"), true).map(|e| e.class),
        Some(MutationClass::Missense)
    );
}
