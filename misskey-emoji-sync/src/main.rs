use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use misskey_emoji_sync::config::SyncConfig;
use misskey_emoji_sync::logging;
use misskey_emoji_sync::sync::engine::{SyncEngine, UploadOptions};
use misskey_emoji_sync::sync::folders::DrivePath;
use misskey_emoji_sync::sync::tasks::{SortOrder, UploadTask, collect_files};

/// Upload a folder of images to a Misskey instance as custom emojis.
///
/// The instance and credentials come from MISSKEY_URL and MISSKEY_TOKEN
/// (a .env file is read if present). Each file becomes an emoji named after
/// the part of its file name before the first ".", lower-cased, with "-"
/// replaced by "_". Names that already exist are skipped.
#[derive(Parser, Debug)]
#[command(name = "misskey-emoji-sync", version, about, long_about)]
struct Cli {
    /// Local emoji folder or a single image file
    path: PathBuf,

    /// Drive folder to upload into, "/" separated; empty for the drive root
    #[arg(short, long, default_value = "emojis")]
    drive_path: String,

    /// Category of the emojis
    #[arg(short, long)]
    category: Option<String>,

    /// License of the emojis
    #[arg(short = 'L', long)]
    license: Option<String>,

    /// Mark the emojis as sensitive
    #[arg(short, long)]
    sensitive: bool,

    /// Make the emojis local only
    #[arg(short = 'l', long, alias = "local_only")]
    local_only: bool,

    /// Upload in reverse file name order
    #[arg(short = 'R', long)]
    reverse: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log: String,
}

impl Cli {
    fn order(&self) -> SortOrder {
        if self.reverse {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    fn upload_options(&self) -> anyhow::Result<UploadOptions> {
        Ok(UploadOptions {
            drive_path: DrivePath::parse(&self.drive_path)?,
            category: self.category.clone().filter(|value| !value.is_empty()),
            license: self.license.clone().filter(|value| !value.is_empty()),
            sensitive: self.sensitive,
            local_only: self.local_only,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(&cli.log).map_err(|err| anyhow::anyhow!("failed to set up logging: {err}"))?;

    let config = SyncConfig::from_env()?;
    let options = cli.upload_options()?;
    let files = collect_files(&cli.path, cli.order())?;
    let tasks = UploadTask::from_paths(files)?;

    let engine = SyncEngine::from_config(&config).context("failed to create Misskey client")?;
    let cancel = engine.executor().cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping");
            cancel.cancel();
        }
    });

    engine.run(&tasks, &options).await?;
    Ok(())
}
