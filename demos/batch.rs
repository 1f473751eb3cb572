//! Download every file listed in a manifest.
//!
//! Each non-empty manifest line is `name<TAB>url<TAB>destination`. Lines
//! starting with `#` are ignored.
//!
//! ```text
//! cargo run --example batch -- manifest.tsv --dir downloads -p 4
//! ```

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use reqwest::Url;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use trawl::pipeline::{Concurrency, PipelineBuilder};
use trawl::task::{task_channel, DownloadTask};

#[derive(Debug, Parser)]
#[command(about = "Download the files listed in a manifest")]
struct Args {
    /// Manifest file with one `name<TAB>url<TAB>destination` entry per line.
    manifest: PathBuf,

    /// Run directory for relative destinations and the error log.
    #[arg(long, default_value = "downloads")]
    dir: PathBuf,

    /// Maximum number of parallel downloads. Zero or less means one per file.
    #[arg(short, long, default_value_t = 4, allow_negative_numbers = true)]
    parallel: i64,

    /// Retries per file.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Do not retry the failed files once more at the end.
    #[arg(long)]
    no_second_pass: bool,
}

fn parse_line(line: &str) -> Result<DownloadTask> {
    let mut fields = line.split('\t');
    let (Some(name), Some(url), Some(destination)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(eyre!("expected name<TAB>url<TAB>destination, got {:?}", line));
    };
    let url = Url::parse(url.trim()).wrap_err_with(|| format!("invalid URL for {}", name))?;
    Ok(DownloadTask::new(name.trim(), &url, destination.trim()))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let manifest = tokio::fs::read_to_string(&args.manifest)
        .await
        .wrap_err_with(|| format!("could not read {}", args.manifest.display()))?;

    let pipeline = PipelineBuilder::new()
        .directory(args.dir)
        .concurrency(args.parallel)
        .retries(args.retries)
        .second_pass(!args.no_second_pass)
        .build();
    if pipeline.concurrency() == Concurrency::Unbounded {
        println!("Running one download per file.");
    }

    // The manifest acts as a streaming task source.
    let (tx, rx) = task_channel(64);
    let producer = tokio::spawn(async move {
        for line in manifest.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok(task) => {
                    if tx.send(task).await.is_err() {
                        break;
                    }
                }
                Err(e) => eprintln!("Skipping manifest line: {:#}", e),
            }
        }
    });

    let summary = pipeline.run_from(rx).await?;
    producer.await?;

    println!("\n{}", summary);
    if !summary.success() {
        std::process::exit(1);
    }
    Ok(())
}
