use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use shardbox_store::{EnumerateRequest, Enumerated, LocalDiskStore, StoreConfig};
use shardbox_types::{BlobDescriptor, Cursor, HashAlgorithm, Partition};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let store = Arc::new(open_store(cli.config.as_ref(), cli.root.as_ref())?);
    match cli.command {
        Command::Put(args) => cmd_put(&store, args, cli.format),
        Command::Ls(args) => cmd_ls(&store, args, cli.format).await,
        Command::Partitions => cmd_partitions(&store, cli.format),
    }
}

fn open_store(config: Option<&PathBuf>, root: Option<&PathBuf>) -> anyhow::Result<LocalDiskStore> {
    let config = match config {
        Some(path) => StoreConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => StoreConfig::with_root(root.cloned().unwrap_or_else(|| PathBuf::from("."))),
    };
    tracing::debug!(
        root = %config.root.display(),
        partitions = config.partitions.len(),
        "using store"
    );
    LocalDiskStore::open(config).context("opening store")
}

impl From<Algorithm> for HashAlgorithm {
    fn from(alg: Algorithm) -> Self {
        match alg {
            Algorithm::Sha256 => HashAlgorithm::Sha256,
            Algorithm::Blake3 => HashAlgorithm::Blake3,
        }
    }
}

fn print_blob(blob: &BlobDescriptor, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}\t{}", blob.address, blob.size),
        OutputFormat::Json => println!("{}", serde_json::to_string(blob)?),
    }
    Ok(())
}

fn cmd_put(store: &LocalDiskStore, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let partition = Partition::from_option(args.partition.as_deref())?;
    let writer = store.writer(&partition)?;
    for file in &args.files {
        let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        let blob = writer.put(args.algorithm.into(), &data)?;
        match format {
            OutputFormat::Text => println!(
                "{} {} {} ({} bytes)",
                "✓".green().bold(),
                file.display(),
                blob.address.to_string().yellow(),
                blob.size
            ),
            OutputFormat::Json => print_blob(&blob, format)?,
        }
    }
    Ok(())
}

async fn cmd_ls(
    store: &Arc<LocalDiskStore>,
    args: LsArgs,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let limit = args.limit.unwrap_or(store.config().default_limit);
    let mut request =
        EnumerateRequest::from_raw(args.partition.as_deref(), &args.after, limit, args.wait)?;

    loop {
        let (mut rx, handle) = store.enumerate_stream(request.clone());
        let mut page = 0usize;
        let mut last = None;
        while let Some(item) = rx.recv().await {
            match item {
                Enumerated::Blob(blob) => {
                    print_blob(&blob, format)?;
                    page += 1;
                    last = Some(blob);
                }
                Enumerated::End => break,
            }
        }
        handle.await.context("enumeration task")??;

        match last {
            Some(last) if args.all && page == limit => {
                request = request.after(Cursor::after(&last)).wait(Duration::ZERO);
            }
            _ => break,
        }
    }
    Ok(())
}

fn cmd_partitions(store: &LocalDiskStore, format: OutputFormat) -> anyhow::Result<()> {
    let resolver = store.partitions();
    let mut rows = vec![(Partition::Default.to_string(), resolver.primary().to_path_buf())];
    for name in resolver.partitions() {
        let partition = Partition::named(name)?;
        rows.push((name.to_string(), resolver.resolve(&partition)?.to_path_buf()));
    }
    match format {
        OutputFormat::Text => {
            for (name, root) in rows {
                println!("{}\t{}", name.bold(), root.display());
            }
        }
        OutputFormat::Json => {
            let map: serde_json::Map<String, serde_json::Value> = rows
                .into_iter()
                .map(|(name, root)| (name, root.display().to_string().into()))
                .collect();
            println!("{}", serde_json::Value::Object(map));
        }
    }
    Ok(())
}
