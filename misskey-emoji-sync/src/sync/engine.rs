use misskey_core::{FileUpload, MisskeyClient, MisskeyError, NewEmoji};
use thiserror::Error;

use crate::config::SyncConfig;

use super::executor::{ExecuteError, RequestExecutor};
use super::folders::{DrivePath, resolve_folder_path};
use super::index::RemoteStateIndex;
use super::registry::EmojiRegistry;
use super::retry::RetryPolicy;
use super::tasks::{InputError, UploadTask};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
    #[error("client setup failed: {0}")]
    Client(#[from] MisskeyError),
    #[error("fetching existing emojis failed: {0}")]
    Index(#[source] ExecuteError),
    #[error("resolving drive folder {path} failed: {source}")]
    Folder {
        path: String,
        #[source]
        source: ExecuteError,
    },
    #[error("uploading {file} failed: {source}")]
    Upload {
        file: String,
        #[source]
        source: ExecuteError,
    },
    #[error("creating emoji {name} failed: {source}")]
    CreateEmoji {
        name: String,
        #[source]
        source: ExecuteError,
    },
}

/// Per-run options applied to every emoji.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Drive folder the files go into; `None` uploads to the drive root.
    pub drive_path: Option<DrivePath>,
    pub category: Option<String>,
    pub license: Option<String>,
    pub sensitive: bool,
    pub local_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created { emoji_id: String, file_id: String },
    SkippedDuplicate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: &UploadOutcome) {
        match outcome {
            UploadOutcome::Created { .. } => self.succeeded += 1,
            UploadOutcome::SkippedDuplicate => self.skipped += 1,
        }
    }
}

/// Uploads local files and registers them as custom emojis, one at a time.
pub struct SyncEngine<R> {
    registry: R,
    executor: RequestExecutor,
}

impl SyncEngine<MisskeyClient> {
    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        let client = MisskeyClient::with_timeout(
            config.base_url.as_str(),
            config.token.clone(),
            config.request_timeout,
        )?;
        Ok(Self::new(
            client,
            RequestExecutor::new(RetryPolicy::fixed(config.rate_limit_wait)),
        ))
    }
}

impl<R: EmojiRegistry> SyncEngine<R> {
    pub fn new(registry: R, executor: RequestExecutor) -> Self {
        Self { registry, executor }
    }

    pub fn with_executor(mut self, executor: RequestExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Processes `tasks` in the given order. Stops at the first error that is
    /// neither a rate limit nor a duplicate name.
    pub async fn run(
        &self,
        tasks: &[UploadTask],
        options: &UploadOptions,
    ) -> Result<RunSummary, SyncError> {
        if tasks.is_empty() {
            return Err(InputError::NoTasks.into());
        }

        let index = RemoteStateIndex::fetch(&self.registry, &self.executor)
            .await
            .map_err(SyncError::Index)?;

        let folder_id = match &options.drive_path {
            Some(path) => {
                let folder = resolve_folder_path(&self.registry, &self.executor, path)
                    .await
                    .map_err(|source| SyncError::Folder {
                        path: path.to_string(),
                        source,
                    })?;
                tracing::info!(path = %path, id = %folder.id, "using drive folder");
                Some(folder.id)
            }
            None => None,
        };

        let mut summary = RunSummary::new(tasks.len());
        for task in tasks {
            let outcome = self
                .process_task(task, &index, folder_id.as_deref(), options)
                .await?;
            summary.record(&outcome);
        }

        tracing::info!(
            "Finished uploading emojis. {} out of {} emojis uploaded.",
            summary.succeeded,
            summary.total
        );
        if summary.skipped > 0 {
            tracing::info!("Skipped {} emojis due to duplicate.", summary.skipped);
        }
        Ok(summary)
    }

    pub async fn process_task(
        &self,
        task: &UploadTask,
        index: &RemoteStateIndex,
        folder_id: Option<&str>,
        options: &UploadOptions,
    ) -> Result<UploadOutcome, SyncError> {
        let name = task.emoji_name.as_str();
        if index.contains(name) {
            tracing::warn!("Emoji {name} already exists. Skipping.");
            return Ok(UploadOutcome::SkippedDuplicate);
        }

        tracing::info!("Uploading emoji {name}...");
        let upload = FileUpload {
            path: task.source_path.clone(),
            file_name: task.file_name.clone(),
            mime_type: task.mime_type(),
            folder_id: folder_id.map(str::to_string),
        };
        let file = self
            .executor
            .execute("upload drive file", || self.registry.upload_file(&upload))
            .await
            .map_err(|source| SyncError::Upload {
                file: task.file_name.clone(),
                source,
            })?;
        tracing::info!(
            "Emoji {name} uploaded successfully with file id {}",
            file.id
        );

        let emoji = NewEmoji {
            name,
            file_id: &file.id,
            category: options.category.as_deref(),
            license: options.license.as_deref(),
            is_sensitive: options.sensitive,
            local_only: options.local_only,
        };
        let created = self
            .executor
            .execute("add emoji", || self.registry.add_emoji(&emoji))
            .await;
        match created {
            Ok(created) => {
                tracing::info!("Emoji {name} created successfully with id {}", created.id);
                Ok(UploadOutcome::Created {
                    emoji_id: created.id,
                    file_id: file.id,
                })
            }
            Err(err) if err.is_duplicate_name() => {
                // The uploaded drive file stays behind unreferenced.
                tracing::warn!(file_id = %file.id, "Emoji {name} already exists. Skipping.");
                Ok(UploadOutcome::SkippedDuplicate)
            }
            Err(source) => Err(SyncError::CreateEmoji {
                name: name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
