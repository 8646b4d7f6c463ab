use std::fmt;

use misskey_core::DriveFolder;

use super::executor::{ExecuteError, RequestExecutor};
use super::registry::EmojiRegistry;
use super::tasks::InputError;

/// Slash separated drive folder path such as `emojis/blobs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrivePath {
    first: String,
    rest: Vec<String>,
}

impl DrivePath {
    /// Parses a user supplied path. An empty string means the drive root and
    /// yields `None`.
    pub fn parse(raw: &str) -> Result<Option<Self>, InputError> {
        if raw.is_empty() {
            return Ok(None);
        }
        let mut segments = raw.split('/').map(str::to_string);
        let first = segments.next().unwrap_or_default();
        let rest: Vec<String> = segments.collect();
        if first.is_empty() || rest.iter().any(String::is_empty) {
            return Err(InputError::InvalidDrivePath(raw.to_string()));
        }
        Ok(Some(Self { first, rest }))
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.first.as_str()).chain(self.rest.iter().map(String::as_str))
    }
}

impl fmt::Display for DrivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.first)?;
        for segment in &self.rest {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Folder found for one path segment.
enum Resolved {
    Existing(String),
    Created(DriveFolder),
}

impl Resolved {
    fn id(&self) -> &str {
        match self {
            Resolved::Existing(id) => id,
            Resolved::Created(folder) => &folder.id,
        }
    }
}

/// Walks `path` from the drive root, reusing folders that already exist and
/// creating the missing ones, and returns the folder of the last segment.
///
/// Each segment is listed before it may be created, one request at a time.
/// When several folders under one parent share a name, the first one listed
/// wins.
pub async fn resolve_folder_path<R: EmojiRegistry>(
    registry: &R,
    executor: &RequestExecutor,
    path: &DrivePath,
) -> Result<DriveFolder, ExecuteError> {
    let mut resolved = resolve_segment(registry, executor, &path.first, None).await?;
    for segment in &path.rest {
        resolved = resolve_segment(registry, executor, segment, Some(resolved.id())).await?;
    }

    match resolved {
        Resolved::Created(folder) => Ok(folder),
        Resolved::Existing(folder_id) => {
            executor
                .execute("show drive folder", || registry.show_folder(&folder_id))
                .await
        }
    }
}

async fn resolve_segment<R: EmojiRegistry>(
    registry: &R,
    executor: &RequestExecutor,
    name: &str,
    parent_id: Option<&str>,
) -> Result<Resolved, ExecuteError> {
    let folders = executor
        .execute("list drive folders", || registry.list_folders(parent_id))
        .await?;

    if let Some(existing) = folders.into_iter().find(|folder| folder.name == name) {
        tracing::debug!(name, id = %existing.id, "drive folder exists");
        return Ok(Resolved::Existing(existing.id));
    }

    tracing::info!(name, parent_id = ?parent_id, "creating drive folder");
    let created = executor
        .execute("create drive folder", || registry.create_folder(name, parent_id))
        .await?;
    Ok(Resolved::Created(created))
}
