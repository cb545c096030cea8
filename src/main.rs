//! VcfDecode CLI entry point
//!
//! Decodes VCF files into per-allele JSON records.

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use vcf_decode::core::io::LineIterator;
use vcf_decode::{
    open_vcf, summarize_warnings, AlleleRecord, DecodeOptions, DecodeStats, HeaderParser,
    VcfDecoder,
};

#[derive(Parser)]
#[command(name = "vcf-decode")]
#[command(about = "Decode VCF variant records into per-allele JSON")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode data lines into one JSON record per ALT allele
    Decode {
        /// Input VCF file (plain, .gz or .bz2)
        input: PathBuf,
        /// Output file (optional, stdout if not specified)
        output: Option<PathBuf>,
        /// Preferred isoform for annotation selection (version ignored)
        #[arg(long)]
        isoform: Option<String>,
        /// Fall back to all isoforms when the preferred one has no annotation
        #[arg(long)]
        genomic: bool,
        /// Accept sites-only files without a #CHROM sample header
        #[arg(long = "no-samples")]
        no_samples: bool,
        /// Number of threads (1 = streaming)
        #[arg(short = 't', long, default_value = "1")]
        threads: usize,
    },
    /// Print the parsed header: field schemas, annotation columns, samples
    Header {
        /// Input VCF file (plain, .gz or .bz2)
        input: PathBuf,
        /// Accept sites-only files without a #CHROM sample header
        #[arg(long = "no-samples")]
        no_samples: bool,
    },
}

fn open_output(output: Option<&Path>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match output {
        Some(path) => Box::new(BufWriter::with_capacity(128 * 1024, File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

fn write_record(out: &mut dyn Write, record: &AlleleRecord) -> io::Result<()> {
    serde_json::to_writer(&mut *out, record)?;
    out.write_all(b"\n")
}

/// Read remaining data lines and decode them on a thread pool
fn decode_parallel<R: io::BufRead>(
    decoder: &mut VcfDecoder,
    lines: &mut LineIterator<R>,
    out: &mut dyn Write,
    threads: usize,
) -> anyhow::Result<DecodeStats> {
    let mut data_lines: Vec<String> = decoder.take_pending().into_iter().collect();
    while let Some(line) = lines.next_line() {
        let line = line?;
        if !line.is_empty() && !line.starts_with('#') {
            data_lines.push(line.to_string());
        }
    }

    let mut stats = DecodeStats::default();
    for result in decoder.decode_batch(&data_lines, threads)? {
        stats.lines += 1;
        match result {
            Ok(decoded) => {
                for record in &decoded.records {
                    write_record(out, record)?;
                }
                stats.records += decoded.records.len();
                stats.warnings.extend(decoded.warnings);
            }
            Err(e) => {
                log::warn!("Line {}: {}", stats.lines, e);
                stats.failed_lines += 1;
            }
        }
    }
    Ok(stats)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Decode {
            input,
            output,
            isoform,
            genomic,
            no_samples,
            threads,
        } => {
            let parser = HeaderParser::new().with_expect_samples(!no_samples);
            let mut options = DecodeOptions::new().with_genomic_fallback(genomic);
            if let Some(isoform) = isoform {
                options = options.with_preferred_isoform(isoform);
            }

            eprintln!("Decoding VCF file: {:?}", input);
            let mut lines = LineIterator::new(open_vcf(&input)?);
            let mut decoder = VcfDecoder::from_reader(&mut lines, &parser, options)?;
            if let Some(summary) = summarize_warnings(decoder.header_warnings()) {
                eprintln!("Header warnings: {}", summary);
            }

            let mut out = open_output(output.as_deref())?;
            let stats = if threads > 1 {
                decode_parallel(&mut decoder, &mut lines, out.as_mut(), threads)?
            } else {
                let mut write_error = None;
                let stats = decoder.decode_stream(&mut lines, |record| {
                    if write_error.is_none() {
                        if let Err(e) = write_record(out.as_mut(), &record) {
                            write_error = Some(e);
                        }
                    }
                })?;
                if let Some(e) = write_error {
                    return Err(e.into());
                }
                stats
            };
            out.flush()?;

            eprintln!("\n=== Decoding Statistics ===");
            eprintln!("Data lines:      {}", stats.lines);
            eprintln!("Records:         {}", stats.records);
            eprintln!("Failed lines:    {}", stats.failed_lines);
            if let Some(summary) = stats.warning_summary() {
                eprintln!("Warnings:        {}", summary);
            }
            eprintln!("Time elapsed:    {:.2}s", start.elapsed().as_secs_f64());
        }

        Commands::Header { input, no_samples } => {
            let parser = HeaderParser::new().with_expect_samples(!no_samples);
            let mut lines = LineIterator::new(open_vcf(&input)?);
            let decoder = VcfDecoder::from_reader(&mut lines, &parser, DecodeOptions::default())?;
            let header = decoder.header();

            let mut info: Vec<_> = header.info.values().collect();
            info.sort_by(|a, b| a.id.cmp(&b.id));
            let mut format: Vec<_> = header.format.values().collect();
            format.sort_by(|a, b| a.id.cmp(&b.id));

            println!("INFO fields:     {}", info.len());
            for schema in info {
                println!("  {}\t{:?}\t{:?}", schema.id, schema.number, schema.value_type);
            }
            println!("FORMAT fields:   {}", format.len());
            for schema in format {
                println!("  {}\t{:?}\t{:?}", schema.id, schema.number, schema.value_type);
            }
            if let Some(columns) = &header.csq_columns {
                println!("CSQ columns:     {}", columns.join("|"));
            }
            if let Some(columns) = &header.ann_columns {
                println!("ANN columns:     {}", columns.join("|"));
            }
            println!("Samples:         {}", header.sample_names().join(","));
            if let Some(summary) = summarize_warnings(decoder.header_warnings()) {
                eprintln!("Header warnings: {}", summary);
            }
        }
    }

    Ok(())
}
