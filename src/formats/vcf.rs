//! VCF data line decoding
//!
//! Tokenizes data lines with zero-copy field access, then splits each locus
//! into one [`AlleleRecord`] per ALT allele with normalized alleles, scoped
//! INFO/FORMAT values and a resolved mutation class.

use crate::core::allele::{normalize_allele, NormalizedAllele, VariantType};
use crate::core::io::LineIterator;
use crate::core::mclass::{DatatypeTag, MutationClass};
use crate::core::value::MISSING;
use crate::core::{summarize_warnings, DecodeError, DecodeWarning, Result, Value};
use crate::formats::annotation::{resolve_best, AnnotationEntry};
use crate::formats::header::{HeaderContext, HeaderParser};
use crate::formats::info::decode_info;
use crate::formats::sample::{decode_samples, FormatDecode, SampleAlleleData};
use log::{debug, trace, warn};
use memchr::memchr;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::BufRead;

/// Chunk size for parallel processing
const CHUNK_SIZE: usize = 10000;

/// Default mutation names longer than this are replaced by the type name
const MAX_DEFAULT_MNAME_LEN: usize = 15;

/// Number of fixed columns of a data line (CHROM..INFO)
const FIXED_FIELDS: usize = 8;

/// Zero-copy view of one data line
/// Only CHROM and POS are parsed immediately, other fields are sliced on access
pub struct VcfRecordView<'a> {
    line: &'a [u8],
    pub chrom: &'a str,
    /// Position as written (1-based)
    pub pos: u64,
    field_bounds: Vec<(usize, usize)>,
}

impl<'a> VcfRecordView<'a> {
    pub fn parse(line: &'a [u8]) -> Result<Self> {
        if line.is_empty() {
            return Err(DecodeError::malformed_line("empty line"));
        }

        let mut field_bounds = Vec::with_capacity(10);
        let mut start = 0;
        while let Some(tab) = memchr(b'\t', &line[start..]) {
            field_bounds.push((start, start + tab));
            start += tab + 1;
        }
        field_bounds.push((start, line.len()));

        if field_bounds.len() < FIXED_FIELDS {
            return Err(DecodeError::malformed_line(format!(
                "too few fields: expected at least {}, found {}",
                FIXED_FIELDS,
                field_bounds.len()
            )));
        }

        let chrom = std::str::from_utf8(&line[field_bounds[0].0..field_bounds[0].1])
            .map_err(|_| DecodeError::malformed_line("invalid UTF-8 in CHROM"))?;
        let pos_str = std::str::from_utf8(&line[field_bounds[1].0..field_bounds[1].1])
            .map_err(|_| DecodeError::malformed_line("invalid UTF-8 in POS"))?;
        let pos: u64 = pos_str
            .parse()
            .map_err(|_| DecodeError::malformed_line(format!("invalid POS: {}", pos_str)))?;

        Ok(Self {
            line,
            chrom,
            pos,
            field_bounds,
        })
    }

    pub fn field_count(&self) -> usize {
        self.field_bounds.len()
    }

    /// Get field as string slice (lazy access)
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.field_bounds
            .get(index)
            .and_then(|(start, end)| std::str::from_utf8(&self.line[*start..*end]).ok())
    }

    pub fn id(&self) -> Option<&'a str> {
        self.field(2)
    }

    pub fn ref_allele(&self) -> Option<&'a str> {
        self.field(3)
    }

    pub fn alt_alleles(&self) -> Option<&'a str> {
        self.field(4)
    }

    pub fn qual(&self) -> Option<&'a str> {
        self.field(5)
    }

    pub fn filter(&self) -> Option<&'a str> {
        self.field(6)
    }

    pub fn info(&self) -> Option<&'a str> {
        self.field(7)
    }

    /// FORMAT field (field 8) if present
    pub fn format(&self) -> Option<&'a str> {
        self.field(8)
    }

    /// Sample fields (fields 9+)
    pub fn samples(&self) -> Vec<&'a str> {
        (9..self.field_count()).filter_map(|i| self.field(i)).collect()
    }
}

/// One tokenized data line, before allele splitting
#[derive(Debug, Clone, PartialEq)]
pub struct RawLocus<'a> {
    pub chrom: &'a str,
    /// 0-based
    pub pos: u64,
    pub id: Option<&'a str>,
    pub ref_allele: &'a str,
    pub alt_alleles: Vec<&'a str>,
    pub qual: Option<f64>,
    pub filter: Option<&'a str>,
    pub info: &'a str,
    pub format: Option<&'a str>,
    pub sample_columns: Vec<&'a str>,
}

impl<'a> RawLocus<'a> {
    pub fn from_view(view: &VcfRecordView<'a>) -> Result<Self> {
        let ref_allele = view
            .ref_allele()
            .ok_or_else(|| DecodeError::malformed_line("invalid REF"))?;
        let alts = view
            .alt_alleles()
            .ok_or_else(|| DecodeError::malformed_line("invalid ALT"))?;

        Ok(Self {
            chrom: view.chrom,
            pos: view.pos.saturating_sub(1),
            id: view.id().filter(|id| *id != MISSING),
            ref_allele,
            alt_alleles: alts.split(',').collect(),
            qual: view.qual().and_then(|q| q.parse::<f64>().ok()),
            filter: view.filter().filter(|f| *f != MISSING),
            info: view.info().unwrap_or(MISSING),
            format: view.format(),
            sample_columns: view.samples(),
        })
    }
}

/// Per-decode settings: the gene/isoform context used to pick annotations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    pub preferred_isoform: Option<String>,
    /// Fall back to all isoforms when the preferred one has no annotation
    pub genomic_fallback: bool,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferred_isoform(mut self, isoform: impl Into<String>) -> Self {
        self.preferred_isoform = Some(isoform.into());
        self
    }

    pub fn with_genomic_fallback(mut self, genomic_fallback: bool) -> Self {
        self.genomic_fallback = genomic_fallback;
        self
    }
}

/// One decoded (locus, ALT allele) pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlleleRecord {
    pub chrom: String,
    /// 0-based, after normalization
    pub pos: u64,
    #[serde(rename = "ref")]
    pub ref_allele: String,
    pub alt: String,
    /// ALT as written in the data line
    pub alt_original: String,
    pub id: Option<String>,
    pub qual: Option<f64>,
    pub filter: Option<String>,
    #[serde(rename = "type")]
    pub variant_type: VariantType,
    /// Locus-level INFO
    pub info: BTreeMap<String, Value>,
    /// `Number=A` INFO for this allele
    pub alt_info: BTreeMap<String, Value>,
    pub samples: Vec<SampleAlleleData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csq: Option<Vec<AnnotationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ann: Option<Vec<AnnotationEntry>>,
    pub class: MutationClass,
    pub dt: DatatypeTag,
    pub mname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isoform: Option<String>,
}

/// Records and warnings of one data line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineDecode {
    pub records: Vec<AlleleRecord>,
    pub warnings: Vec<DecodeWarning>,
}

/// Class, datatype and naming of one allele
struct Resolution {
    class: MutationClass,
    dt: DatatypeTag,
    mname: String,
    gene: Option<String>,
    isoform: Option<String>,
}

/// Mutation name used when no annotation supplied one
pub fn default_mname(allele: &NormalizedAllele) -> String {
    if allele.is_symbolic() {
        return allele.alt.clone();
    }
    let mname = format!("{}>{}", allele.ref_allele, allele.alt);
    if mname.len() > MAX_DEFAULT_MNAME_LEN {
        allele.variant_type.as_str().to_string()
    } else {
        mname
    }
}

/// CSQ wins over ANN; noncoding winners were already discarded
fn resolve_class(
    allele: &NormalizedAllele,
    csq: &[AnnotationEntry],
    ann: &[AnnotationEntry],
    options: &DecodeOptions,
) -> Resolution {
    let preferred = options.preferred_isoform.as_deref();
    let best = resolve_best(csq, preferred, options.genomic_fallback)
        .or_else(|| resolve_best(ann, preferred, options.genomic_fallback));

    match best {
        Some(entry) => Resolution {
            class: entry.class,
            dt: entry.dt,
            mname: entry
                .mname
                .clone()
                .unwrap_or_else(|| default_mname(allele)),
            gene: entry.gene.clone(),
            isoform: entry.isoform.clone(),
        },
        None => Resolution {
            class: MutationClass::from_variant_type(allele.variant_type),
            dt: DatatypeTag::SnvIndel,
            mname: default_mname(allele),
            gene: None,
            isoform: None,
        },
    }
}

/// Decode one data line into one record per emitted ALT allele.
///
/// `NON_REF` and malformed symbolic alleles are dropped; the rest of the
/// locus still decodes. Fails only when the line itself is unusable.
pub fn decode_line(line: &str, header: &HeaderContext, options: &DecodeOptions) -> Result<LineDecode> {
    let view = VcfRecordView::parse(line.as_bytes())?;
    let locus = RawLocus::from_view(&view)?;

    let alleles: Vec<NormalizedAllele> = locus
        .alt_alleles
        .iter()
        .map(|alt| normalize_allele(locus.pos, locus.ref_allele, alt))
        .collect();

    let info = decode_info(locus.info, header, &locus.alt_alleles);
    let samples = match locus.format {
        Some(format) => decode_samples(
            format,
            &locus.sample_columns,
            header,
            locus.ref_allele,
            &alleles,
        ),
        None => FormatDecode {
            per_allele: vec![Vec::new(); alleles.len()],
            ..Default::default()
        },
    };

    let mut warnings = info.warnings;
    warnings.extend(samples.warnings);

    let mut alt_info = info.per_allele.into_iter();
    let mut csq = info.csq.into_iter();
    let mut ann = info.ann.into_iter();
    let mut sample_data = samples.per_allele.into_iter();

    let mut records = Vec::with_capacity(alleles.len());
    for allele in alleles {
        let alt_info = alt_info.next().unwrap_or_default();
        let csq = csq.next().unwrap_or_default();
        let ann = ann.next().unwrap_or_default();
        let sample_data = sample_data.next().unwrap_or_default();

        if !allele.valid {
            warnings.push(DecodeWarning::InvalidSymbolicAllele(allele.original.clone()));
            continue;
        }
        if allele.is_non_ref() {
            trace!("{}:{} skipping NON_REF allele", locus.chrom, locus.pos);
            continue;
        }

        let resolution = resolve_class(&allele, &csq, &ann, options);

        records.push(AlleleRecord {
            chrom: locus.chrom.to_string(),
            pos: allele.pos,
            ref_allele: allele.ref_allele,
            alt: allele.alt,
            alt_original: allele.original,
            id: locus.id.map(str::to_string),
            qual: locus.qual,
            filter: locus.filter.map(str::to_string),
            variant_type: allele.variant_type,
            info: info.locus.clone(),
            alt_info,
            samples: sample_data,
            csq: if csq.is_empty() { None } else { Some(csq) },
            ann: if ann.is_empty() { None } else { Some(ann) },
            class: resolution.class,
            dt: resolution.dt,
            mname: resolution.mname,
            gene: resolution.gene,
            isoform: resolution.isoform,
        });
    }

    Ok(LineDecode { records, warnings })
}

/// Decoding statistics
#[derive(Debug, Default, Clone)]
pub struct DecodeStats {
    /// Data lines seen
    pub lines: usize,
    /// Records emitted
    pub records: usize,
    /// Data lines rejected as malformed
    pub failed_lines: usize,
    pub warnings: Vec<DecodeWarning>,
}

impl DecodeStats {
    /// Batched warning summary, see [`summarize_warnings`]
    pub fn warning_summary(&self) -> Option<String> {
        summarize_warnings(&self.warnings)
    }
}

/// Decoder bound to one file's header
#[derive(Debug, Clone)]
pub struct VcfDecoder {
    header: HeaderContext,
    options: DecodeOptions,
    header_warnings: Vec<DecodeWarning>,
    /// First data line of a sites-only file, read while looking for `#CHROM`
    pending: Option<String>,
}

impl VcfDecoder {
    pub fn new(header: HeaderContext, options: DecodeOptions) -> Self {
        Self {
            header,
            options,
            header_warnings: Vec::new(),
            pending: None,
        }
    }

    /// Read the header block from `lines`, stopping after `#CHROM` (or at
    /// the first data line when samples are not expected).
    pub fn from_reader<R: BufRead>(
        lines: &mut LineIterator<R>,
        parser: &HeaderParser,
        options: DecodeOptions,
    ) -> Result<Self> {
        let mut builder = parser.builder();
        let mut pending = None;

        while let Some(line) = lines.next_line() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                if builder.push_line(line)? {
                    break;
                }
            } else {
                pending = Some(line.to_string());
                break;
            }
        }

        let parsed = builder.finish()?;
        for warning in &parsed.warnings {
            warn!("Header: {}", warning);
        }

        Ok(Self {
            header: parsed.context,
            options,
            header_warnings: parsed.warnings,
            pending,
        })
    }

    pub fn header(&self) -> &HeaderContext {
        &self.header
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn header_warnings(&self) -> &[DecodeWarning] {
        &self.header_warnings
    }

    /// Data line read ahead by [`VcfDecoder::from_reader`], if any
    pub fn take_pending(&mut self) -> Option<String> {
        self.pending.take()
    }

    pub fn decode_line(&self, line: &str) -> Result<LineDecode> {
        decode_line(line, &self.header, &self.options)
    }

    /// Decode lines in parallel, keeping input order.
    ///
    /// One result per input line; a rejected line never affects its
    /// neighbours.
    pub fn decode_batch(&self, lines: &[String], threads: usize) -> Result<Vec<Result<LineDecode>>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .build()
            .map_err(|e| {
                DecodeError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create thread pool: {}", e),
                ))
            })?;

        let chunks: Vec<Vec<Result<LineDecode>>> = pool.install(|| {
            lines
                .par_chunks(CHUNK_SIZE)
                .map(|chunk| chunk.iter().map(|line| self.decode_line(line)).collect())
                .collect()
        });

        Ok(chunks.into_iter().flatten().collect())
    }

    /// Decode every remaining data line of `lines`, handing each record to
    /// `sink`. Malformed lines are counted and skipped.
    pub fn decode_stream<R, F>(&mut self, lines: &mut LineIterator<R>, mut sink: F) -> Result<DecodeStats>
    where
        R: BufRead,
        F: FnMut(AlleleRecord),
    {
        let mut stats = DecodeStats::default();

        if let Some(line) = self.pending.take() {
            self.decode_into(&line, &mut stats, &mut sink);
        }

        while let Some(line) = lines.next_line() {
            let line = line?;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            self.decode_into(line, &mut stats, &mut sink);
        }

        debug!(
            "Decoded {} lines into {} records ({} failed, {} warnings)",
            stats.lines,
            stats.records,
            stats.failed_lines,
            stats.warnings.len()
        );
        Ok(stats)
    }

    fn decode_into<F: FnMut(AlleleRecord)>(&self, line: &str, stats: &mut DecodeStats, sink: &mut F) {
        stats.lines += 1;
        match self.decode_line(line) {
            Ok(decoded) => {
                stats.records += decoded.records.len();
                stats.warnings.extend(decoded.warnings);
                decoded.records.into_iter().for_each(|record| sink(record));
            }
            Err(e) => {
                warn!("Line {}: {}", stats.lines, e);
                stats.failed_lines += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::header::parse_header;
    use std::io::BufReader;

    const HEADER: &[&str] = &[
        "##fileformat=VCFv4.2",
        r#"##INFO=<ID=DP,Number=1,Type=Integer,Description="Depth">"#,
        r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Allele frequency">"#,
        r#"##INFO=<ID=CSQ,Number=.,Type=String,Description="Consequence annotations from Ensembl VEP. Format: Allele|Consequence|SYMBOL|Feature_type|Feature|HGVSp">"#,
        r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#,
        r#"##FORMAT=<ID=AD,Number=R,Type=Integer,Description="Allelic depths">"#,
        "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1",
    ];

    fn header() -> HeaderContext {
        parse_header(HEADER).unwrap().context
    }

    #[test]
    fn test_vcf_record_view_basic() {
        let line = b"chr1\t12345\trs123\tA\tG\t30\tPASS\tDP=100";
        let view = VcfRecordView::parse(line).unwrap();

        assert_eq!(view.chrom, "chr1");
        assert_eq!(view.pos, 12345);
        assert_eq!(view.id(), Some("rs123"));
        assert_eq!(view.ref_allele(), Some("A"));
        assert_eq!(view.alt_alleles(), Some("G"));
        assert_eq!(view.qual(), Some("30"));
        assert_eq!(view.filter(), Some("PASS"));
        assert_eq!(view.info(), Some("DP=100"));
        assert_eq!(view.format(), None);
    }

    #[test]
    fn test_vcf_record_view_with_samples() {
        let line = b"chr1\t12345\t.\tA\tG\t.\t.\t.\tGT:DP\t0/1:30\t1/1:25";
        let view = VcfRecordView::parse(line).unwrap();
        assert_eq!(view.format(), Some("GT:DP"));
        assert_eq!(view.samples(), vec!["0/1:30", "1/1:25"]);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(matches!(
            VcfRecordView::parse(b"chr1\t12345\trs123"),
            Err(DecodeError::MalformedDataLine { .. })
        ));
        assert!(matches!(
            VcfRecordView::parse(b"chr1\tabc\t.\tA\tG\t.\t.\t."),
            Err(DecodeError::MalformedDataLine { .. })
        ));
        assert!(matches!(
            VcfRecordView::parse(b""),
            Err(DecodeError::MalformedDataLine { .. })
        ));
    }

    #[test]
    fn test_raw_locus() {
        let line = b"chr1\t100\t.\tA\tG,T\t50.5\t.\tDP=3";
        let view = VcfRecordView::parse(line).unwrap();
        let locus = RawLocus::from_view(&view).unwrap();
        assert_eq!(locus.pos, 99);
        assert_eq!(locus.id, None);
        assert_eq!(locus.alt_alleles, vec!["G", "T"]);
        assert_eq!(locus.qual, Some(50.5));
        assert_eq!(locus.filter, None);
        assert_eq!(locus.format, None);
    }

    #[test]
    fn test_decode_multiallelic() {
        let line = "chr17\t7579472\trs1\tG\tC,T\t99\tPASS\tDP=40;AF=0.25,0.5\tGT:AD\t1/2:10,20,30";
        let decoded = decode_line(line, &header(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.records.len(), 2);

        let c = &decoded.records[0];
        assert_eq!(c.pos, 7579471);
        assert_eq!(c.alt, "C");
        assert_eq!(c.variant_type, VariantType::Snv);
        assert_eq!(c.class, MutationClass::Snv);
        assert_eq!(c.mname, "G>C");
        assert_eq!(c.info.get("DP"), Some(&Value::Integer(40)));
        assert_eq!(c.alt_info.get("AF"), Some(&Value::Float(0.25)));
        assert_eq!(c.samples.len(), 1);
        assert_eq!(c.samples[0].genotype.as_deref(), Some("C/T"));

        let t = &decoded.records[1];
        assert_eq!(t.alt_info.get("AF"), Some(&Value::Float(0.5)));
    }

    #[test]
    fn test_non_ref_filtered() {
        let line = "chr1\t100\t.\tG\tA,<NON_REF>\t.\t.\t.";
        let decoded = decode_line(line, &header(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(decoded.records[0].alt, "A");
    }

    #[test]
    fn test_invalid_symbolic_excluded() {
        let line = "chr1\t100\t.\tG\tA,<DEL\t.\t.\t.";
        let decoded = decode_line(line, &header(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert_eq!(
            decoded.warnings,
            vec![DecodeWarning::InvalidSymbolicAllele("<DEL".to_string())]
        );
    }

    #[test]
    fn test_symbolic_allele_record() {
        let line = "chr1\t100\t.\tG\t<DUP>\t.\t.\t.";
        let decoded = decode_line(line, &header(), &DecodeOptions::default()).unwrap();
        let record = &decoded.records[0];
        assert_eq!(record.variant_type, VariantType::SymbolicAllele);
        assert_eq!(record.class, MutationClass::Nonstandard);
        assert_eq!(record.mname, "DUP");
    }

    #[test]
    fn test_long_default_mname_replaced() {
        let line = "chr1\t100\t.\tA\tATTTTTTTTTTTTTTTTT\t.\t.\t.";
        let decoded = decode_line(line, &header(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.records[0].mname, "insertion");
    }

    #[test]
    fn test_csq_class_and_noncoding_fallback() {
        let line = "chr1\t100\t.\tC\tT,G\t.\t.\tCSQ=T|missense_variant|TP53|Transcript|NM_000546.5|NP_1:p.Arg2Trp,G|upstream_gene_variant|TP53|Transcript|NM_000546.5|";
        let decoded = decode_line(line, &header(), &DecodeOptions::default()).unwrap();

        let t = &decoded.records[0];
        assert_eq!(t.class, MutationClass::Missense);
        assert_eq!(t.mname, "Arg2Trp");
        assert_eq!(t.gene.as_deref(), Some("TP53"));
        assert_eq!(t.isoform.as_deref(), Some("NM_000546"));

        let g = &decoded.records[1];
        assert!(g.csq.is_some());
        assert_eq!(g.class, MutationClass::Snv);
        assert_eq!(g.mname, "C>G");
    }

    #[test]
    fn test_decoder_stream() {
        let text = format!(
            "{}\nchr1\t100\t.\tA\tG\t.\t.\tDP=1;XX=2\tGT\t0/1\nbad line\nchr1\t200\t.\tC\tT,A\t.\t.\t.\tGT\t1/2\n",
            HEADER.join("\n")
        );
        let mut lines = LineIterator::new(BufReader::new(text.as_bytes()));
        let mut decoder =
            VcfDecoder::from_reader(&mut lines, &HeaderParser::new(), DecodeOptions::default())
                .unwrap();
        assert_eq!(decoder.header().samples.len(), 1);

        let mut records = Vec::new();
        let stats = decoder
            .decode_stream(&mut lines, |record| records.push(record))
            .unwrap();

        assert_eq!(stats.lines, 3);
        assert_eq!(stats.records, 3);
        assert_eq!(stats.failed_lines, 1);
        assert_eq!(records.len(), 3);
        assert_eq!(
            stats.warning_summary().as_deref(),
            Some("1 unknown INFO keys (XX)")
        );
    }

    #[test]
    fn test_sites_only_first_line_kept() {
        let text = "##fileformat=VCFv4.2\nchr1\t100\t.\tA\tG\t.\t.\t.\n";
        let mut lines = LineIterator::new(BufReader::new(text.as_bytes()));
        let parser = HeaderParser::new().with_expect_samples(false);
        let mut decoder =
            VcfDecoder::from_reader(&mut lines, &parser, DecodeOptions::default()).unwrap();

        let mut count = 0;
        let stats = decoder.decode_stream(&mut lines, |_| count += 1).unwrap();
        assert_eq!(stats.lines, 1);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_decode_batch_keeps_order() {
        let decoder = VcfDecoder::new(header(), DecodeOptions::default());
        let lines: Vec<String> = (1..=50)
            .map(|i| format!("chr1\t{}\t.\tA\tG\t.\t.\t.", i))
            .chain(std::iter::once("broken".to_string()))
            .collect();

        let results = decoder.decode_batch(&lines, 4).unwrap();
        assert_eq!(results.len(), 51);
        for (i, result) in results.iter().take(50).enumerate() {
            let decoded = result.as_ref().unwrap();
            assert_eq!(decoded.records[0].pos, i as u64);
        }
        assert!(results[50].is_err());
    }

    #[test]
    fn test_non_ascii_alleles_do_not_sink_batch() {
        let decoder = VcfDecoder::new(header(), DecodeOptions::default());
        let lines = vec![
            "chr1\t100\t.\tA\tG\t.\t.\t.".to_string(),
            "chr1\t100\t.\téX\tèX\t.\t.\t.".to_string(),
        ];

        let results = decoder.decode_batch(&lines, 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().records[0].alt, "G");

        let odd = &results[1].as_ref().unwrap().records[0];
        assert_eq!(odd.pos, 99);
        assert_eq!(odd.ref_allele, "é");
        assert_eq!(odd.alt, "è");
        assert_eq!(odd.variant_type, VariantType::NonStandard);
        assert_eq!(odd.class, MutationClass::Nonstandard);
    }

    #[test]
    fn test_max_position_does_not_overflow() {
        let line = format!("chr1\t{}\t.\tAT\tAC\t.\t.\t.", u64::MAX);
        let decoded = decode_line(&line, &header(), &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.records[0].pos, u64::MAX);
    }
}
