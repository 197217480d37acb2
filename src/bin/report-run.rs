//! CLI tool to produce an employee salary report from a JSON records file.
//!
//! Usage:
//!   report-run <employees.json>
//!   report-run <employees.json> -p <report.pipe> -o <report.html>
//!
//! Without a pipeline file the report is built from flags. If no output
//! file is specified, writes to stdout.

use chrono::{Local, NaiveDate};
use clap::Parser;
use payroll_report::{Column, Format, ReportPipeline, SortOrder, execute_report};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render an employee salary report as CSV or HTML.
#[derive(Parser)]
#[command(name = "report-run")]
struct Cli {
    /// Employee records file (JSON array, or /dev/stdin)
    input: String,

    /// Pipeline definition file (.pipe); overrides the report flags
    #[arg(short, long)]
    pipeline: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Csv)]
    format: Format,

    /// Sort direction for last names
    #[arg(long, value_enum, default_value_t = SortOrder::Ascending)]
    order: SortOrder,

    /// Keep records in input order
    #[arg(long, conflicts_with = "order")]
    unsorted: bool,

    /// Add a Social Security column
    #[arg(long)]
    ssn: bool,

    /// Include inactive employees
    #[arg(long)]
    all: bool,

    /// Leave social security numbers uncensored
    #[arg(long)]
    no_censor: bool,

    /// Report date for HTML output (YYYY-MM-DD, default today)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Log stages and record counts on stderr (-vv for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn report_pipeline(&self) -> ReportPipeline {
        let mut columns = Column::DEFAULT_HEADER.to_vec();
        if self.ssn {
            columns.push(Column::SocialSecurity);
        }

        let pipeline = ReportPipeline::new()
            .censor(!self.no_censor)
            .active_only(!self.all)
            .columns(columns)
            .format(self.format);

        if self.unsorted {
            pipeline.unsorted()
        } else {
            pipeline.order(self.order)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let input_text = match fs::read_to_string(&cli.input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading input file '{}': {e}", cli.input);
            process::exit(1);
        }
    };

    let pipeline_text = match &cli.pipeline {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error reading pipeline file '{path}': {e}");
                process::exit(1);
            }
        },
        None => cli.report_pipeline().to_pipeline_text(),
    };

    let as_of = cli.as_of.unwrap_or_else(|| Local::now().date_naive());

    info!(
        input = %cli.input,
        pipeline = cli.pipeline.as_deref().unwrap_or("(flags)"),
        output = cli.output.as_deref().unwrap_or("(stdout)"),
        %as_of,
        "running report"
    );

    let report = match execute_report(&input_text, &pipeline_text, as_of) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Report error: {e}");
            process::exit(1);
        }
    };

    if let Some(out_path) = &cli.output {
        if let Some(parent) = Path::new(out_path.as_str()).parent()
            && !parent.as_os_str().is_empty()
            && fs::create_dir_all(parent).is_err()
        {
            eprintln!("Error creating output directory for '{out_path}'");
            process::exit(1);
        }
        if let Err(e) = fs::write(out_path, &report.text) {
            eprintln!("Error writing output file '{out_path}': {e}");
            process::exit(1);
        }
    } else {
        if let Err(e) = io::stdout().write_all(report.text.as_bytes()) {
            eprintln!("Error writing output: {e}");
            process::exit(1);
        }
        if !report.text.is_empty() && !report.text.ends_with('\n') {
            println!();
        }
    }

    info!(
        records = report.input_count,
        rows = report.output_count,
        "report written"
    );
}
