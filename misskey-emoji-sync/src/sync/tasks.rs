use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("path {0} does not exist")]
    NotFound(PathBuf),
    #[error("no files found in {0}")]
    NoFiles(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot derive an emoji name from {0}")]
    InvalidName(PathBuf),
    #[error("invalid drive path {0:?}: empty folder name")]
    InvalidDrivePath(String),
    #[error("nothing to upload")]
    NoTasks,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Emoji name for a file: everything before the first `.`, lower-cased,
/// with `-` turned into `_`.
pub fn derive_emoji_name(file_name: &str) -> String {
    file_name
        .split('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
        .replace('-', "_")
}

/// One local file waiting to become an emoji.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub source_path: PathBuf,
    pub file_name: String,
    pub emoji_name: String,
}

impl UploadTask {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, InputError> {
        let source_path = path.into();
        let file_name = source_path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .ok_or_else(|| InputError::InvalidName(source_path.clone()))?;
        let emoji_name = derive_emoji_name(&file_name);
        if emoji_name.is_empty() {
            return Err(InputError::InvalidName(source_path));
        }
        Ok(Self {
            source_path,
            file_name,
            emoji_name,
        })
    }

    /// Builds tasks for every path, failing on the first unusable one so
    /// nothing is sent to the server for a bad batch.
    pub fn from_paths(
        paths: impl IntoIterator<Item = PathBuf>,
    ) -> Result<Vec<Self>, InputError> {
        paths.into_iter().map(Self::from_path).collect()
    }

    /// MIME type guessed from the file name, `application/octet-stream` when
    /// unknown.
    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.file_name)
            .first_or_octet_stream()
            .to_string()
    }
}

/// Lists the files to upload from `path`: the regular files directly inside
/// it when it is a directory, or the path itself when it is a file.
pub fn collect_files(path: &Path, order: SortOrder) -> Result<Vec<PathBuf>, InputError> {
    let io_err = |source| InputError::Io {
        path: path.to_path_buf(),
        source,
    };

    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }

    let mut files = if path.is_dir() {
        let root = std::path::absolute(path).map_err(io_err)?;
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&root).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let candidate = entry.path();
            if candidate.is_file() {
                files.push(candidate);
            }
        }
        files
    } else if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        Vec::new()
    };

    if files.is_empty() {
        return Err(InputError::NoFiles(path.to_path_buf()));
    }

    files.sort();
    if order == SortOrder::Descending {
        files.reverse();
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn derives_lowercase_snake_name() {
        assert_eq!(derive_emoji_name("Foo-Bar.png"), "foo_bar");
        assert_eq!(derive_emoji_name("blob-cat-Happy.gif"), "blob_cat_happy");
    }

    #[test]
    fn derive_keeps_only_text_before_first_dot() {
        assert_eq!(derive_emoji_name("a.b.c.png"), "a");
        assert_eq!(derive_emoji_name("noext"), "noext");
        assert_eq!(derive_emoji_name(".hidden.png"), "");
    }

    #[test]
    fn task_uses_base_name_only() {
        let task = UploadTask::from_path("/tmp/Some.Dir/Party-Parrot.webp").unwrap();
        assert_eq!(task.file_name, "Party-Parrot.webp");
        assert_eq!(task.emoji_name, "party_parrot");
    }

    #[test]
    fn task_rejects_empty_name() {
        assert!(matches!(
            UploadTask::from_path("/tmp/.png"),
            Err(InputError::InvalidName(_))
        ));
    }

    #[test]
    fn mime_type_is_guessed_from_extension() {
        let png = UploadTask::from_path("cat.png").unwrap();
        assert_eq!(png.mime_type(), "image/png");
        let unknown = UploadTask::from_path("cat.zzzunknown").unwrap();
        assert_eq!(unknown.mime_type(), "application/octet-stream");
    }

    #[test]
    fn collect_lists_direct_files_sorted() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.png"), b"b").unwrap();
        std::fs::write(dir.path().join("a.png"), b"a").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.png"), b"c").unwrap();

        let files = collect_files(dir.path(), SortOrder::Ascending).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|file| file.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.png", "b.png"]);
        assert!(files.iter().all(|file| file.is_absolute()));

        let reversed = collect_files(dir.path(), SortOrder::Descending).unwrap();
        assert_eq!(reversed.first().unwrap().file_name().unwrap(), "b.png");
    }

    #[test]
    fn collect_single_file() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("cat.png");
        std::fs::write(&file, b"cat").unwrap();
        assert_eq!(
            collect_files(&file, SortOrder::Ascending).unwrap(),
            vec![file]
        );
    }

    #[test]
    fn collect_rejects_missing_and_empty() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            collect_files(&dir.path().join("missing"), SortOrder::Ascending),
            Err(InputError::NotFound(_))
        ));
        assert!(matches!(
            collect_files(dir.path(), SortOrder::Ascending),
            Err(InputError::NoFiles(_))
        ));
    }
}
