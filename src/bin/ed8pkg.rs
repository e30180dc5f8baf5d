use std::fs;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ed8pkg::extract::{DirSink, ExtractOptions, find_companion, unpack};

/// Unpacks ".pkg" files from the ED8 / Trails of Cold Steel series of games.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The input pkg file.
    input_file: PathBuf,

    /// Output directory, created if missing.
    /// Defaults to the input path with "__" appended.
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Path to common.pkg.
    /// Defaults to a common.pkg next to the input file, if there is one.
    #[arg(long)]
    common_pkg_file: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let input = fs::canonicalize(&cli.input_file)
        .with_context(|| format!("cannot resolve {}", cli.input_file.display()))?;
    if !input.is_file() {
        bail!("{} is not a file", input.display());
    }

    let out_dir = cli.output_path.unwrap_or_else(|| {
        let mut name = input.clone().into_os_string();
        name.push("__");
        PathBuf::from(name)
    });
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("cannot create {}", out_dir.display()))?;

    let companion = match cli.common_pkg_file {
        Some(path) if !path.is_file() => bail!("{} is not a file", path.display()),
        Some(path) => Some(path),
        None => find_companion(&input),
    };

    let mut sink = DirSink::new(&out_dir);
    let report = unpack(input.as_path(), companion, &mut sink, &ExtractOptions::default())
        .with_context(|| format!("failed to unpack {}", input.display()))?;

    println!(
        "{} files extracted to {}, {} skipped",
        report.extracted.len(),
        out_dir.display(),
        report.skipped.len()
    );
    Ok(())
}
