use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use compver::evidence::{gather_evidence, EvidenceOpts};

#[derive(Parser, Debug)]
#[command(
    name = "compver",
    version,
    about = "Collect component build evidence and publish it to a registry"
)]
struct Cli {
    /// Registry base URL
    #[arg(long)]
    url: String,

    /// Submitting user id
    #[arg(long)]
    user: String,

    /// Submitting user password
    #[arg(long)]
    pass: String,

    /// Path to a pre-built CycloneDX JSON SBOM
    #[arg(long, value_name = "PATH")]
    sbom: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    gather_evidence(&EvidenceOpts {
        url: cli.url,
        user: cli.user,
        password: cli.pass,
        sbom_path: cli.sbom,
    })
}
