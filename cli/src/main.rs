//! geommark CLI - bounding boxes and page-source reports for marked TeX elements

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use geommark::model::Severity;
use geommark::parser::write_ndjson;
use geommark::reliability::summarize_boxes;
use geommark::render::{render_box_summary, render_report, to_json, write_atomic};
use geommark::{
    classify::summarize_elements, default_boxes_path, default_semantic_path, AuxOptions,
    Diagnostic, Geommark, JsonFormat, PageSelection, ParseOptions, Verdict,
};

#[derive(Parser)]
#[command(name = "geommark")]
#[command(version)]
#[command(about = "Turn TeX position markers into bounding boxes and reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize marked boxes from a position record stream
    Boxes {
        /// Input NDJSON record stream
        #[arg(value_name = "NDJSON")]
        input: PathBuf,

        /// Output file (defaults to <stem>-marked-boxes.json beside the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Pixel resolution for the _px fields
        #[arg(long, env = "GEOMMARK_DPI", default_value = "72")]
        dpi: f64,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long, env = "GEOMMARK_PAGES")]
        pages: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Report how reliable the page numbers of a record stream are
    Validate {
        /// Input NDJSON record stream
        #[arg(value_name = "NDJSON")]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify the lines of a rendered layout document
    Classify {
        /// Input layout JSON (array of pages)
        #[arg(value_name = "LAYOUT")]
        input: PathBuf,

        /// Output file (defaults to <stem>-semantic.json beside the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long, env = "GEOMMARK_PAGES")]
        pages: Option<String>,
    },

    /// Rebuild the record stream and boxes from a LaTeX aux file
    SyncAux {
        /// Input .aux file
        #[arg(value_name = "AUX")]
        input: PathBuf,

        /// Output directory (defaults to the aux file's directory)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Job name used for output files (defaults to the aux file stem)
        #[arg(long, value_name = "NAME")]
        job_name: Option<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Boxes {
            input,
            output,
            dpi,
            pages,
            compact,
        } => cmd_boxes(&input, output.as_deref(), dpi, pages.as_deref(), compact),
        Commands::Validate { input, json } => cmd_validate(&input, json),
        Commands::Classify {
            input,
            output,
            pages,
        } => cmd_classify(&input, output.as_deref(), pages.as_deref()),
        Commands::SyncAux {
            input,
            output_dir,
            job_name,
        } => cmd_sync_aux(&input, output_dir.as_deref(), job_name.as_deref()),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn page_selection(pages: Option<&str>) -> Result<PageSelection, Box<dyn std::error::Error>> {
    match pages {
        Some(p) => Ok(PageSelection::parse(p)?),
        None => Ok(PageSelection::All),
    }
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity() {
            Severity::Warning => eprintln!("  {} {}", "warning:".yellow().bold(), diagnostic),
            Severity::Info => eprintln!("  {} {}", "note:".cyan(), diagnostic),
        }
    }
}

fn cmd_boxes(
    input: &Path,
    output: Option<&Path>,
    dpi: f64,
    pages: Option<&str>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_boxes_path(input));

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    log::debug!("boxes: {} -> {} at {} dpi", input.display(), output.display(), dpi);

    let result = Geommark::new()
        .with_dpi(dpi)
        .with_pages(page_selection(pages)?)
        .parse(input)?;
    println!(
        "{} {} position records",
        "Loaded".green(),
        result.records.len()
    );

    let synthesis = result.write_boxes_with_format(&output, format)?;
    print_diagnostics(&synthesis.diagnostics);

    print!("{}", render_box_summary(&summarize_boxes(&synthesis.boxes)));
    println!("{} {}", "Saved to".green(), output.display());

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let result = Geommark::new().parse(input)?;
    let report = result.report();
    log::debug!(
        "validate: {} records, verdict {:?}",
        result.records.len(),
        report.verdict
    );

    if json {
        println!("{}", to_json(&report, JsonFormat::Pretty)?);
        return Ok(());
    }

    println!("{}", "Page Source Validation Report".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    print_diagnostics(&result.diagnostics);
    println!();

    print!("{}", render_report(&report));
    println!();

    let verdict = match report.verdict {
        Verdict::Good => "GOOD".green().bold(),
        Verdict::Fair => "FAIR".yellow().bold(),
        Verdict::Poor => "POOR".red().bold(),
    };
    println!("{}: {}", "Verdict".bold(), verdict);

    Ok(())
}

fn cmd_classify(
    input: &Path,
    output: Option<&Path>,
    pages: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| default_semantic_path(input));

    let options = ParseOptions::new().with_pages(page_selection(pages)?);
    let classified = geommark::classify_file_with_options(input, &options)?;
    log::debug!("classify: {} pages from {}", classified.len(), input.display());

    let json = to_json(&classified, JsonFormat::Pretty)?;
    write_atomic(&output, json.as_bytes())?;

    println!("{}", "Element Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for (element_type, count) in summarize_elements(&classified) {
        println!("{}: {}", element_type.as_str().bold(), count);
    }
    println!("{} {}", "Saved to".green(), output.display());

    Ok(())
}

fn cmd_sync_aux(
    input: &Path,
    output_dir: Option<&Path>,
    job_name: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output_dir
        .map(|p| p.to_path_buf())
        .or_else(|| input.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&output_dir)?;

    let job = match job_name {
        Some(name) => name.to_string(),
        None => input
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned(),
    };
    let ndjson_path = output_dir.join(format!("{}-texpos.ndjson", job));
    log::debug!("sync-aux: job {:?} into {}", job, output_dir.display());

    // Column metrics from a previous run are more accurate than the defaults.
    let mut aux_options = AuxOptions::new();
    if ndjson_path.exists() {
        let previous = geommark::read_records(&ndjson_path)?;
        if let Some(first) = previous.records.first() {
            log::debug!("Reusing column metrics from {}", ndjson_path.display());
            aux_options = aux_options.with_columns_from(first);
        }
    }

    let result = Geommark::new().parse_aux(input, &aux_options)?;
    print_diagnostics(&result.diagnostics);

    let mut ndjson = Vec::new();
    write_ndjson(&result.records, &mut ndjson)?;
    write_atomic(&ndjson_path, &ndjson)?;
    println!(
        "{} {} records to {}",
        "Wrote".green(),
        result.records.len(),
        ndjson_path.display()
    );

    let boxes_path = output_dir.join(format!("{}-marked-boxes.json", job));
    let synthesis = result.write_boxes(&boxes_path)?;
    println!(
        "{} {} boxes to {}",
        "Wrote".green(),
        synthesis.boxes.len(),
        boxes_path.display()
    );

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "geommark".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Bounding boxes for marked TeX elements");
}
