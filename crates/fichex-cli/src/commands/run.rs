//! Batch processing command.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use fichex_core::{
    BatchReport, BatchRunner, MappingSet, Outcome, PureOcrEngine, ReadOptions, TemplateWriter,
    DEFAULT_MIN_QUALITY,
};

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Input PDF files, a directory, or a glob pattern
    #[arg(short, long, required = true)]
    input: String,

    /// Mapping file (YAML)
    #[arg(short, long, default_value = "mapping.yaml")]
    mapping: PathBuf,

    /// Template workbook (XLSX)
    #[arg(short, long)]
    template: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "saida")]
    output_dir: PathBuf,

    /// Target sheet name (default: first sheet of the template)
    #[arg(long)]
    sheet: Option<String>,

    /// Directory with OCR model files
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// Run OCR on every page regardless of text quality
    #[arg(long)]
    force_ocr: bool,

    /// Minimum non-whitespace characters before a page falls back to OCR
    #[arg(long, default_value_t = DEFAULT_MIN_QUALITY)]
    min_quality: usize,

    /// Also write a summary.csv next to the outputs
    #[arg(long)]
    summary: bool,
}

pub fn run(args: RunArgs) -> anyhow::Result<()> {
    let start = Instant::now();

    let files = collect_inputs(&args.input)?;
    if files.is_empty() {
        anyhow::bail!("no PDF documents found for: {}", args.input);
    }

    let mapping = MappingSet::load(&args.mapping)?;
    let mut writer = TemplateWriter::new(&args.template)?;
    if let Some(sheet) = &args.sheet {
        writer = writer.with_sheet(sheet.clone())?;
    }

    println!(
        "{} Found {} document(s), {} mapped field(s)",
        style("ℹ").blue(),
        files.len(),
        mapping.len()
    );

    // OCR is optional: without models the pipeline still handles
    // digital PDFs and warns on pages that would have needed fallback.
    let ocr = match PureOcrEngine::from_dir(&args.model_dir) {
        Ok(engine) => Some(engine),
        Err(e) => {
            if args.force_ocr {
                anyhow::bail!("--force-ocr set but OCR models unavailable: {e}");
            }
            warn!("OCR unavailable ({}); continuing without fallback", e);
            None
        }
    };

    let options = ReadOptions {
        force_ocr: args.force_ocr,
        min_quality: args.min_quality,
    };
    let mut runner = BatchRunner::new(&mapping, &writer).with_options(options);
    if let Some(engine) = &ocr {
        runner = runner.with_ocr(engine);
    }

    fs::create_dir_all(&args.output_dir)?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut report = BatchReport::default();
    for path in &files {
        report.documents.push(runner.run_one(path, &args.output_dir));
        pb.inc(1);
    }
    pb.finish_with_message("Complete");

    write_report_jsonl(&args.output_dir.join("report.jsonl"), &report)?;
    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary(&summary_path, &report)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} document(s) in {:?}",
        style("✓").green(),
        report.documents.len(),
        start.elapsed()
    );
    println!(
        "   {} done, {} failed",
        style(report.done_count()).green(),
        style(report.failed_count()).red()
    );

    let failed: Vec<_> = report.documents.iter().filter(|d| !d.is_done()).collect();
    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed documents:").red());
        for doc in &failed {
            if let Outcome::Failed { stage, reason } = &doc.outcome {
                println!("  - {} ({:?}): {}", doc.path.display(), stage, reason);
            }
        }
    }

    // Per-document failures are reported, never fatal to the process.
    Ok(())
}

/// Resolve the input argument to a sorted list of PDF paths.
fn collect_inputs(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    let mut files: Vec<PathBuf> = if path.is_dir() {
        glob(&format!("{}/**/*.pdf", input.trim_end_matches('/')))?
            .filter_map(|r| r.ok())
            .collect()
    } else if input.contains(['*', '?', '[']) {
        glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
            })
            .collect()
    } else if path.exists() {
        vec![path.to_path_buf()]
    } else {
        Vec::new()
    };

    files.sort();
    debug!("resolved {} input document(s)", files.len());
    Ok(files)
}

/// One JSON document per line, per processed document.
fn write_report_jsonl(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    let mut file = fs::File::create(path)?;
    for doc in &report.documents {
        serde_json::to_writer(&mut file, doc)?;
        file.write_all(b"\n")?;
    }
    Ok(())
}

fn write_summary(path: &Path, report: &BatchReport) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["filename", "status", "fields", "ocr_pages", "stage", "error"])?;

    for doc in &report.documents {
        let filename = doc
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");
        match &doc.outcome {
            Outcome::Done { fields, ocr_pages, .. } => {
                wtr.write_record([
                    filename,
                    "done",
                    &fields.to_string(),
                    &ocr_pages.to_string(),
                    "",
                    "",
                ])?;
            }
            Outcome::Failed { stage, reason } => {
                wtr.write_record([filename, "failed", "", "", &format!("{stage:?}"), reason])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}
