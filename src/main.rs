// Entry point and high-level CLI flow.
//
// Load the coded records, build the six cross-tab worksheets for the
// selected countries, then write the workbook plus any optional exports
// and print a short preview of what was produced.
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use gmmp_report::types::BuildSummary;
use gmmp_report::{loader, output, util, CountrySet, ReportBuilder, ReportConfig};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gmmp-report")]
#[command(author, version, about = "Cross-tabulated media monitoring reports", long_about = None)]
struct Cli {
    /// CSV file of coded observation records
    #[arg(value_name = "RECORDS")]
    records: PathBuf,

    /// Country codes to report on, comma separated (e.g. KE,UG)
    #[arg(short, long)]
    countries: String,

    /// Year label stamped on every worksheet (defaults to the current year)
    #[arg(short, long)]
    year: Option<String>,

    /// JSON file overriding the built-in enumerations and media registry
    #[arg(long)]
    config: Option<PathBuf>,

    /// Workbook to write
    #[arg(short, long, default_value = "report.xlsx")]
    output: PathBuf,

    /// Also write every data cell in long form to this CSV file
    #[arg(long)]
    tidy_csv: Option<PathBuf>,

    /// Also write a JSON build summary
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Worksheets to preview on the console
    #[arg(long, default_value_t = 6)]
    preview: usize,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => ReportConfig::from_path(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => ReportConfig::default(),
    };

    let countries = CountrySet::parse(&cli.countries);
    if countries.is_empty() {
        warn!("no country codes given, worksheets will have no country rows");
    }
    let year = cli.year.unwrap_or_else(|| Utc::now().year().to_string());

    let (store, load_report) = loader::load_records(&cli.records, &config)
        .with_context(|| format!("loading {}", cli.records.display()))?;
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        util::format_int(load_report.total_rows),
        util::format_int(load_report.loaded_rows)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse/validation errors.",
            util::format_int(load_report.parse_errors)
        );
    }
    if load_report.unknown_media > 0 {
        println!(
            "Note: {} rows belong to media outside the registry ({}).",
            util::format_int(load_report.unknown_media),
            load_report.unknown_labels.join(", ")
        );
    }
    println!();

    let builder = ReportBuilder::new(countries, year).with_config(config);
    let doc = builder.build(&store).context("building report")?;

    output::write_xlsx(&cli.output, &doc)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    println!("Workbook saved to {}\n", cli.output.display());

    if let Some(path) = &cli.tidy_csv {
        let rows = output::tidy_rows(&doc);
        output::write_csv(path, &rows)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("(Long-form table exported to {})\n", path.display());
    }

    let summary_rows = output::summarize(&doc);
    if let Some(path) = &cli.summary_json {
        let summary = BuildSummary {
            year: builder.year().to_string(),
            countries: builder.countries().codes().to_vec(),
            generated_at: Utc::now(),
            worksheets: summary_rows.clone(),
        };
        output::write_json(path, &summary)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("Summary saved to {}\n", path.display());
    }

    output::preview_table_rows(&summary_rows, cli.preview);
    Ok(())
}
