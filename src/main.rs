use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wlcgsgas::cli::{Cli, OutputFormat};
use wlcgsgas::config::PipelineConfig;
use wlcgsgas::csv_output::CsvOutput;
use wlcgsgas::json_output::JsonOutput;
use wlcgsgas::pipeline::Pipeline;
use wlcgsgas::{source, text_output};

/// Initialize tracing subscriber; warnings always, everything with --debug
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Configuration file merged with command line overrides
fn load_config(args: &Cli) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(factor) = args.scale_factor {
        config.scale_factor = factor;
    }
    if let Some(days) = args.days {
        config.equivalence_days = Some(days);
    }
    if let Some(collapse) = &args.collapse {
        config.collapse = collapse.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    init_tracing(args.debug);

    if args.print_query {
        if let Some(period) = args.period {
            println!("{}", period.render_query().trim());
        }
        return Ok(());
    }

    let rows_path = match &args.rows {
        Some(path) => path,
        None => anyhow::bail!("Must specify a row file with --rows FILE (or --print-query)"),
    };

    let config = load_config(&args)?;
    let mut pipeline = Pipeline::new(&config)?;
    if let Some(period) = args.period {
        pipeline = pipeline.with_period(period);
    }

    let rows = source::read_rows(rows_path, args.input_format)?;
    let report = pipeline.run(rows).context("Record transformation failed")?;

    if let Some(summary) = text_output::missing_scale_summary(&report) {
        eprintln!("{}", summary);
    }

    match args.format {
        OutputFormat::Text => print!("{}", text_output::render(&report)),
        OutputFormat::Json => println!("{}", JsonOutput::new(&report).to_json()?),
        OutputFormat::Csv => print!("{}", CsvOutput::new(report.records).to_csv()?),
    }

    Ok(())
}
