use clap::{Parser, Subcommand};
use anyhow::Result;
use dotenvy::dotenv;

use jobtext::{compare, describe, extraction, parse, telemetry};

#[derive(Parser)]
#[command(name = "jobtext", about = "Best-effort text extraction for web pages and job postings")]
struct Cli {
    /// Emit a single JSON envelope to stdout; logs go to stderr
    #[arg(global = true, long, default_value_t = false)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL and print its text
    Extract(extraction::ExtractCmd),
    /// Pull a job description out of saved HTML
    Describe(describe::DescribeCmd),
    /// Extract a job posting and turn it into structured fields
    Parse(parse::ParseCmd),
    /// Score a resume against a job posting
    Compare(compare::CompareCmd),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    telemetry::config::set_json_mode(cli.json);

    // initialize logging/tracing (stderr). Respect RUST_LOG and JOBTEXT_LOG_FORMAT
    telemetry::config::init_tracing();

    match cli.command {
        Commands::Extract(args) => extraction::run(args).await?,
        Commands::Describe(args) => describe::run(args).await?,
        Commands::Parse(args) => parse::run(args).await?,
        Commands::Compare(args) => compare::run(args).await?,
    }

    Ok(())
}
