//! VCF meta-header parsing
//!
//! Reads `##INFO`/`##FORMAT` declarations into field schemas, extracts the
//! VEP (`CSQ`) and snpEff (`ANN`) sub-column lists from their descriptions,
//! and reads the sample names from the `#CHROM` line.
//!
//! ```text
//! ##INFO=<ID=AF,Number=A,Type=Float,Description="Allele frequency">
//! ##FORMAT=<ID=AD,Number=R,Type=Integer,Description="Allelic depths">
//! #CHROM  POS  ID  REF  ALT  QUAL  FILTER  INFO  FORMAT  S1  S2
//! ```

use crate::core::{DecodeError, DecodeWarning, FieldSchema, NumberArity, Result, ValueType};
use log::{debug, warn};
use std::collections::HashMap;

/// Minimum columns of a `#CHROM` line (CHROM..INFO)
const FIXED_COLUMNS: usize = 8;

/// Index of the first sample column
const FIRST_SAMPLE_COLUMN: usize = 9;

/// One sample column of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRef {
    pub name: String,
}

/// Read-only decoding context shared by every data line of a file
#[derive(Debug, Clone, Default)]
pub struct HeaderContext {
    pub info: HashMap<String, FieldSchema>,
    pub format: HashMap<String, FieldSchema>,
    pub samples: Vec<SampleRef>,
    /// VEP CSQ sub-columns, when the CSQ description carried them
    pub csq_columns: Option<Vec<String>>,
    /// snpEff ANN sub-columns, when the ANN description carried them
    pub ann_columns: Option<Vec<String>>,
}

impl HeaderContext {
    pub fn info_schema(&self, id: &str) -> Option<&FieldSchema> {
        self.info.get(id)
    }

    pub fn format_schema(&self, id: &str) -> Option<&FieldSchema> {
        self.format.get(id)
    }

    pub fn sample_names(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Outcome of a header parse: the context plus non-fatal warnings
#[derive(Debug, Clone)]
pub struct ParsedHeader {
    pub context: HeaderContext,
    pub warnings: Vec<DecodeWarning>,
}

/// Caller-supplied sample rename; must return one name per input name
pub type SampleRename = Box<dyn Fn(&[String]) -> Vec<String> + Send + Sync>;

/// Configurable meta-header parser
pub struct HeaderParser {
    expect_samples: bool,
    rename: Option<SampleRename>,
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self {
            expect_samples: true,
            rename: None,
        }
    }
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a missing or sample-less `#CHROM` line is fatal (default: true)
    pub fn with_expect_samples(mut self, expect_samples: bool) -> Self {
        self.expect_samples = expect_samples;
        self
    }

    /// Rename sample names as they are read from `#CHROM`
    pub fn with_sample_rename<F>(mut self, rename: F) -> Self
    where
        F: Fn(&[String]) -> Vec<String> + Send + Sync + 'static,
    {
        self.rename = Some(Box::new(rename));
        self
    }

    pub fn expects_samples(&self) -> bool {
        self.expect_samples
    }

    /// Start an incremental parse, one header line at a time
    pub fn builder(&self) -> HeaderBuilder<'_> {
        HeaderBuilder {
            parser: self,
            context: HeaderContext::default(),
            warnings: Vec::new(),
            seen_chrom: false,
        }
    }

    /// Parse a complete block of header lines
    pub fn parse<I, S>(&self, lines: I) -> Result<ParsedHeader>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = self.builder();
        for line in lines {
            builder.push_line(line.as_ref())?;
        }
        builder.finish()
    }
}

/// Parse header lines with default options (samples expected, no rename)
pub fn parse_header<I, S>(lines: I) -> Result<ParsedHeader>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    HeaderParser::new().parse(lines)
}

/// Incremental header parse state
pub struct HeaderBuilder<'p> {
    parser: &'p HeaderParser,
    context: HeaderContext,
    warnings: Vec<DecodeWarning>,
    seen_chrom: bool,
}

impl<'p> HeaderBuilder<'p> {
    /// Feed one header line. Returns `true` once the `#CHROM` line was read.
    pub fn push_line(&mut self, line: &str) -> Result<bool> {
        let line = line.trim_end_matches(['\r', '\n']);

        if let Some(body) = line.strip_prefix("##INFO=") {
            if let Some(schema) = self.meta_schema(line, body, "INFO") {
                insert_schema(&mut self.context.info, schema);
            }
        } else if let Some(body) = line.strip_prefix("##FORMAT=") {
            if let Some(schema) = self.meta_schema(line, body, "FORMAT") {
                insert_schema(&mut self.context.format, schema);
            }
        } else if line.starts_with("#CHROM") {
            self.context.samples = self.parse_chrom_line(line)?;
            self.seen_chrom = true;
        }

        Ok(self.seen_chrom)
    }

    pub fn seen_chrom_line(&self) -> bool {
        self.seen_chrom
    }

    /// Validate and build the context
    pub fn finish(mut self) -> Result<ParsedHeader> {
        if !self.seen_chrom && self.parser.expect_samples {
            return Err(DecodeError::malformed_header("#CHROM line not found"));
        }

        if let Some(schema) = self.context.info.get("CSQ") {
            match csq_columns(&schema.description) {
                Some(columns) => self.context.csq_columns = Some(columns),
                None => self.unparsed_annotation("CSQ"),
            }
        }
        if let Some(schema) = self.context.info.get("ANN") {
            match ann_columns(&schema.description) {
                Some(columns) => self.context.ann_columns = Some(columns),
                None => self.unparsed_annotation("ANN"),
            }
        }

        debug!(
            "Header: {} INFO, {} FORMAT, {} samples, {} warnings",
            self.context.info.len(),
            self.context.format.len(),
            self.context.samples.len(),
            self.warnings.len()
        );

        Ok(ParsedHeader {
            context: self.context,
            warnings: self.warnings,
        })
    }

    fn unparsed_annotation(&mut self, key: &str) {
        let description = self
            .context
            .info
            .get(key)
            .map(|s| s.description.clone())
            .unwrap_or_default();
        warn!("Cannot parse {} column list; values will be kept verbatim", key);
        self.warnings.push(DecodeWarning::AnnotationFormatUnparsed {
            key: key.to_string(),
            description,
        });
    }

    fn meta_schema(&mut self, line: &str, body: &str, kind: &str) -> Option<FieldSchema> {
        let inner = match body.strip_prefix('<') {
            Some(rest) => rest.strip_suffix('>').unwrap_or(rest),
            None => {
                self.warnings.push(DecodeWarning::MalformedMetaLine {
                    line: line.to_string(),
                    reason: format!("{} line is not a <...> structure", kind),
                });
                return None;
            }
        };

        let attrs = parse_meta_attributes(inner);
        let id = match attrs.get("ID") {
            Some(id) if !id.is_empty() => id.clone(),
            _ => {
                self.warnings.push(DecodeWarning::MalformedMetaLine {
                    line: line.to_string(),
                    reason: format!("{} line has no ID", kind),
                });
                return None;
            }
        };

        Some(FieldSchema::new(
            id,
            NumberArity::parse(attrs.get("Number").map(String::as_str)),
            ValueType::parse(attrs.get("Type").map(String::as_str)),
            attrs.get("Description").cloned().unwrap_or_default(),
        ))
    }

    fn parse_chrom_line(&self, line: &str) -> Result<Vec<SampleRef>> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < FIXED_COLUMNS {
            return Err(DecodeError::malformed_header(format!(
                "#CHROM line has {} columns, expected at least {}",
                columns.len(),
                FIXED_COLUMNS
            )));
        }
        if self.parser.expect_samples && columns.len() < FIRST_SAMPLE_COLUMN {
            return Err(DecodeError::malformed_header(format!(
                "#CHROM line has {} columns, expected FORMAT and sample columns",
                columns.len()
            )));
        }

        let names: Vec<String> = columns
            .iter()
            .skip(FIRST_SAMPLE_COLUMN)
            .map(|s| s.to_string())
            .collect();

        let names = match &self.parser.rename {
            Some(rename) => {
                let renamed = rename(&names);
                if renamed.len() != names.len() {
                    return Err(DecodeError::SampleRenameMismatch {
                        expected: names.len(),
                        found: renamed.len(),
                    });
                }
                renamed
            }
            None => names,
        };

        Ok(names.into_iter().map(|name| SampleRef { name }).collect())
    }
}

fn insert_schema(map: &mut HashMap<String, FieldSchema>, schema: FieldSchema) {
    if map.contains_key(&schema.id) {
        debug!("Duplicate declaration for {}; keeping the last one", schema.id);
    }
    map.insert(schema.id.clone(), schema);
}

/// Split the inside of a `<...>` meta structure into key/value attributes.
///
/// `,` and `=` are delimiters only outside double quotes, so descriptions
/// may contain both. Surrounding quotes are removed; `\"` is a literal quote.
pub fn parse_meta_attributes(body: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    let mut key = String::new();
    let mut value = String::new();
    let mut in_value = false;
    let mut in_quotes = false;
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    value.push(next);
                }
            }
            '"' => in_quotes = !in_quotes,
            '=' if !in_quotes && !in_value => in_value = true,
            ',' if !in_quotes => {
                if !key.trim().is_empty() {
                    attrs.insert(key.trim().to_string(), std::mem::take(&mut value));
                }
                key.clear();
                value.clear();
                in_value = false;
            }
            _ if in_value => value.push(c),
            _ => key.push(c),
        }
    }
    if !key.trim().is_empty() {
        attrs.insert(key.trim().to_string(), value);
    }

    attrs
}

/// Column list of a VEP CSQ description (`... Format: Allele|Consequence|...`)
pub fn csq_columns(description: &str) -> Option<Vec<String>> {
    let (_, list) = description.split_once(" Format: ")?;
    let columns: Vec<String> = list.trim().split('|').map(|s| s.trim().to_string()).collect();
    if columns.len() > 1 {
        Some(columns)
    } else {
        None
    }
}

/// Column list of a snpEff ANN description (`... 'Allele | Annotation | ...'`)
pub fn ann_columns(description: &str) -> Option<Vec<String>> {
    let list = description.split('\'').nth(1)?;
    let columns: Vec<String> = list.split('|').map(|s| s.trim().to_string()).collect();
    if columns.len() > 1 {
        Some(columns)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROM: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\tS2";

    #[test]
    fn test_attributes_quoted_commas() {
        let attrs = parse_meta_attributes(
            r#"ID=XX,Number=1,Type=String,Description="a, b=c, and \"d\"""#,
        );
        assert_eq!(attrs.get("ID").unwrap(), "XX");
        assert_eq!(attrs.get("Number").unwrap(), "1");
        assert_eq!(attrs.get("Description").unwrap(), r#"a, b=c, and "d""#);
    }

    #[test]
    fn test_parse_info_and_format() {
        let parsed = parse_header([
            "##fileformat=VCFv4.2",
            r#"##INFO=<ID=AF,Number=A,Type=Float,Description="Allele Frequency">"#,
            r#"##INFO=<ID=DB,Number=0,Type=Flag,Description="dbSNP">"#,
            r#"##FORMAT=<ID=GT,Number=1,Type=String,Description="Genotype">"#,
            CHROM,
        ])
        .unwrap();

        let af = parsed.context.info_schema("AF").unwrap();
        assert_eq!(af.number, NumberArity::PerAltAllele);
        assert_eq!(af.value_type, ValueType::Float);
        assert_eq!(parsed.context.info_schema("DB").unwrap().number, NumberArity::Fixed(0));
        assert!(parsed.context.format_schema("GT").is_some());
        assert_eq!(parsed.context.sample_names(), vec!["S1", "S2"]);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_missing_id_is_skipped_with_warning() {
        let parsed = parse_header([
            r#"##INFO=<Number=1,Type=Integer,Description="no id">"#,
            r#"##INFO=<ID=DP,Number=1,Type=Integer,Description="Depth">"#,
            CHROM,
        ])
        .unwrap();
        assert_eq!(parsed.context.info.len(), 1);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(matches!(parsed.warnings[0], DecodeWarning::MalformedMetaLine { .. }));
    }

    #[test]
    fn test_number_defaults_to_unbounded() {
        let parsed = parse_header([
            r#"##INFO=<ID=X,Type=String,Description="no number">"#,
            CHROM,
        ])
        .unwrap();
        assert_eq!(parsed.context.info_schema("X").unwrap().number, NumberArity::Unbounded);
    }

    #[test]
    fn test_csq_columns() {
        let parsed = parse_header([
            r#"##INFO=<ID=CSQ,Number=.,Type=String,Description="Consequence annotations from Ensembl VEP. Format: Allele|Consequence|IMPACT|SYMBOL">"#,
            CHROM,
        ])
        .unwrap();
        assert_eq!(
            parsed.context.csq_columns.unwrap(),
            vec!["Allele", "Consequence", "IMPACT", "SYMBOL"]
        );
    }

    #[test]
    fn test_csq_without_format_marker_warns() {
        let parsed = parse_header([
            r#"##INFO=<ID=CSQ,Number=.,Type=String,Description="Consequence annotations">"#,
            CHROM,
        ])
        .unwrap();
        assert!(parsed.context.csq_columns.is_none());
        assert!(matches!(
            parsed.warnings[0],
            DecodeWarning::AnnotationFormatUnparsed { .. }
        ));
    }

    #[test]
    fn test_ann_columns() {
        let parsed = parse_header([
            r#"##INFO=<ID=ANN,Number=.,Type=String,Description="Functional annotations: 'Allele | Annotation | Annotation_Impact | Gene_Name | HGVS.c' ">"#,
            CHROM,
        ])
        .unwrap();
        assert_eq!(
            parsed.context.ann_columns.unwrap(),
            vec!["Allele", "Annotation", "Annotation_Impact", "Gene_Name", "HGVS.c"]
        );
    }

    #[test]
    fn test_missing_chrom_line_is_fatal() {
        let result = parse_header([r#"##INFO=<ID=DP,Number=1,Type=Integer,Description="d">"#]);
        assert!(matches!(result, Err(DecodeError::MalformedHeader { .. })));
    }

    #[test]
    fn test_short_chrom_line_is_fatal() {
        let result = parse_header(["#CHROM\tPOS\tID"]);
        assert!(matches!(result, Err(DecodeError::MalformedHeader { .. })));
    }

    #[test]
    fn test_sites_only_when_samples_not_expected() {
        let parsed = HeaderParser::new()
            .with_expect_samples(false)
            .parse(["#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO"])
            .unwrap();
        assert!(parsed.context.samples.is_empty());
    }

    #[test]
    fn test_sample_rename() {
        let parsed = HeaderParser::new()
            .with_sample_rename(|names| names.iter().map(|n| n.to_lowercase()).collect())
            .parse([CHROM])
            .unwrap();
        assert_eq!(parsed.context.sample_names(), vec!["s1", "s2"]);
    }

    #[test]
    fn test_sample_rename_cardinality_mismatch() {
        let result = HeaderParser::new()
            .with_sample_rename(|names| names.iter().take(1).cloned().collect())
            .parse([CHROM]);
        assert!(matches!(
            result,
            Err(DecodeError::SampleRenameMismatch { expected: 2, found: 1 })
        ));
    }
}
