//! `strata` — command line front end for the Strata content store.
//!
//! # Usage
//!
//! ```text
//! strata ingest clip.mp4                  # chunk, hash and store a file
//! strata show <file-hash>                 # print the origin manifest
//! strata cat <file-hash> -o out.mp4      # reconstruct a file
//! strata token <file-hash>                # emit a shareable lineage token
//! strata verify <file-hash> clip.mp4      # check both identities
//! ```

mod config;
mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use strata_cas::Blake3Hasher;
use strata_engine::{CancelToken, EngineConfig, MemorySource, StrataEngine};
use strata_lineage::{LineageCapsule, encode_token};
use strata_store::{FjallKv, StorageLayer};
use strata_types::{ContentHash, OriginManifest};
use tracing::info;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "strata", version, about = "Strata content-addressed file store")]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory.
    #[arg(short, long, global = true, env = "STRATA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a file: chunk, hash, and persist it with its lineage.
    Ingest {
        /// File to ingest.
        file: PathBuf,

        /// Override the MIME type instead of guessing from the extension.
        #[arg(short, long)]
        mime: Option<String>,
    },

    /// Print the origin manifest for a file hash.
    Show {
        /// Whole-file hash, as 64 hex characters.
        hash: String,
    },

    /// Reconstruct a file from its stored chunks.
    Cat {
        /// Whole-file hash, as 64 hex characters.
        hash: String,

        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Emit a shareable token carrying the file's full lineage.
    Token {
        /// Whole-file hash, as 64 hex characters.
        hash: String,
    },

    /// Re-hash a local file and compare both identities to the manifest.
    Verify {
        /// Whole-file hash, as 64 hex characters.
        hash: String,

        /// Local file to compare against.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(dir) = cli.data_dir {
        config.store.data_dir = dir;
    }

    telemetry::init(&config.log.level);

    let engine = open_engine(&config)?;
    match cli.command {
        Commands::Ingest { file, mime } => cmd_ingest(&engine, &file, mime).await,
        Commands::Show { hash } => cmd_show(&engine, &hash).await,
        Commands::Cat { hash, output } => cmd_cat(&engine, &hash, output.as_deref()).await,
        Commands::Token { hash } => cmd_token(&engine, &hash).await,
        Commands::Verify { hash, file } => cmd_verify(&engine, &hash, &file).await,
    }
}

fn open_engine(config: &CliConfig) -> Result<StrataEngine> {
    std::fs::create_dir_all(&config.store.data_dir)
        .context("failed to create data directory")?;
    let kv = FjallKv::open(&config.store.data_dir).context("failed to open record store")?;

    let mut engine_config = EngineConfig {
        strict: config.chunking.strict,
        ..EngineConfig::default()
    };
    if let Some(base) = config.chunking.base_chunk_bytes {
        engine_config.base_chunk_bytes = base;
    }

    Ok(StrataEngine::new(
        engine_config,
        StorageLayer::new(Arc::new(kv)),
        Arc::new(Blake3Hasher),
    ))
}

async fn cmd_ingest(engine: &StrataEngine, file: &Path, mime: Option<String>) -> Result<()> {
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unnamed".to_string());
    let mime = mime.unwrap_or_else(|| guess_mime(file).to_string());

    let source = MemorySource::new(name, mime, data);
    let receipt = match engine.ingest(&source).await? {
        Some(receipt) => receipt,
        None => bail!("storage is not available"),
    };

    info!(%receipt.origin_sig, "ingested");
    println!("{}", receipt.origin_sig);
    Ok(())
}

async fn cmd_show(engine: &StrataEngine, hash: &str) -> Result<()> {
    let manifest = lookup_manifest(engine, hash).await?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

async fn cmd_cat(engine: &StrataEngine, hash: &str, output: Option<&Path>) -> Result<()> {
    let manifest = lookup_manifest(engine, hash).await?;
    let lineage = engine.load_lineage(&manifest.file_hash).await;
    let blob = engine
        .assemble_blob(&manifest, &lineage, &CancelToken::new())
        .await
        .context("reconstruction failed")?;

    match output {
        Some(path) => {
            tokio::fs::write(path, &blob)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(bytes = blob.len(), path = %path.display(), "reconstructed");
        }
        None => {
            use tokio::io::AsyncWriteExt;
            tokio::io::stdout().write_all(&blob).await?;
        }
    }
    Ok(())
}

async fn cmd_token(engine: &StrataEngine, hash: &str) -> Result<()> {
    let manifest = lookup_manifest(engine, hash).await?;
    let entries = engine.load_lineage(&manifest.file_hash).await.into_entries();
    if entries.len() as u64 != manifest.merkle.leaf_count {
        bail!(
            "lineage is incomplete: {} of {} chunks present",
            entries.len(),
            manifest.merkle.leaf_count
        );
    }
    println!("{}", encode_token(&LineageCapsule::new(manifest.file_hash, entries)));
    Ok(())
}

async fn cmd_verify(engine: &StrataEngine, hash: &str, file: &Path) -> Result<()> {
    let manifest = lookup_manifest(engine, hash).await?;
    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let source = MemorySource::new(
        manifest.file_name.clone(),
        manifest.mime.clone(),
        data,
    );

    if engine.verify_consistency(&source, &manifest).await? {
        println!("ok: file hash and merkle root both match");
        Ok(())
    } else {
        bail!("mismatch: file does not match the stored manifest");
    }
}

async fn lookup_manifest(engine: &StrataEngine, hash: &str) -> Result<OriginManifest> {
    let file_hash = ContentHash::from_hex(hash).context("invalid file hash")?;
    engine
        .storage()
        .get_manifest(&file_hash)
        .await
        .with_context(|| format!("no manifest for {file_hash}"))
}

/// Map common file extensions to MIME types.
fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") | Some("md") => "text/plain",
        _ => "application/octet-stream",
    }
}
