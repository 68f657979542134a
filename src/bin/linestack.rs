use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linestack", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the estimated height, risk tier and file count without decoding anything.
    Estimate(EstimateArgs),
    /// Compose the job and write one JPEG per segment.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct EstimateArgs {
    /// Export job JSON.
    #[arg(long)]
    job: PathBuf,

    /// Override the job's output width (720 or 1080).
    #[arg(long)]
    width: Option<u32>,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Export job JSON.
    #[arg(long)]
    job: PathBuf,

    /// Directory the JPEGs are written to (created if missing).
    #[arg(long)]
    out_dir: PathBuf,

    /// File name stem; multi-file exports get `_01`, `_02`, ... suffixes.
    #[arg(long, default_value = linestack::DEFAULT_BASENAME)]
    basename: String,

    /// Override the job's output width (720 or 1080).
    #[arg(long)]
    width: Option<u32>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Estimate(args) => cmd_estimate(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn load_job(path: &Path, width: Option<u32>) -> anyhow::Result<(linestack::ExportJob, PathBuf)> {
    let mut job = linestack::ExportJob::from_path(path)?;
    if let Some(w) = width {
        job.settings.output_width = linestack::OutputWidth::try_from(w)?;
    }
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((job, base_dir))
}

fn cmd_estimate(args: EstimateArgs) -> anyhow::Result<()> {
    let (job, base_dir) = load_job(&args.job, args.width)?;
    let records = job.records(&base_dir)?;
    let report =
        linestack::assess_export(&records, &job.global_crop, &job.settings, &job.limits)?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    } else {
        println!("images:     {}", records.len());
        println!("width:      {}", job.settings.output_width);
        println!("height:     {}", report.estimated_height);
        println!("risk:       {}", report.risk);
        println!("files:      {}", report.estimated_segments);
    }
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let (job, base_dir) = load_job(&args.job, args.width)?;
    let records = job.records(&base_dir)?;
    let opts = job.compose_options(&base_dir);

    let mut stage = None;
    let segments =
        linestack::compose_with(&records, &job.global_crop, &job.settings, &opts, |p| {
            if stage != Some(p.stage) {
                stage = Some(p.stage);
                tracing::info!(percent = p.percent, "{}", p.stage.label());
            }
        })?;

    let written = linestack::write_outputs(&args.out_dir, &args.basename, &segments)?;
    for (path, seg) in written.iter().zip(&segments) {
        eprintln!("wrote {} ({}x{})", path.display(), seg.width, seg.height);
    }
    Ok(())
}
