use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use misskey_core::{
    ApiError, CreatedEmoji, DriveFile, DriveFolder, EmojiRecord, FileUpload, MisskeyError,
    NewEmoji,
};

use super::registry::EmojiRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListEmojis,
    AddEmoji,
    ListFolders,
    ShowFolder,
    CreateFolder,
    UploadFile,
}

#[derive(Default)]
struct State {
    emojis: Vec<EmojiRecord>,
    unlisted: HashSet<String>,
    folders: Vec<DriveFolder>,
    files: Vec<DriveFile>,
    calls: HashMap<Op, usize>,
    failures: HashMap<Op, VecDeque<MisskeyError>>,
    next_id: u32,
}

impl State {
    fn begin(&mut self, op: Op) -> Result<(), MisskeyError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

/// In-memory registry that behaves like a small Misskey instance.
#[derive(Default)]
pub struct FakeRegistry {
    state: Mutex<State>,
}

impl FakeRegistry {
    pub fn with_emojis(names: &[&str]) -> Self {
        let registry = Self::default();
        {
            let mut state = registry.state.lock().unwrap();
            for name in names {
                let id = state.id("emoji");
                state.emojis.push(EmojiRecord {
                    name: name.to_string(),
                    id: Some(id),
                    file_id: None,
                    category: None,
                });
            }
        }
        registry
    }

    /// Registers a name the listing does not return, as if another client
    /// created it after the listing was taken.
    pub fn add_unlisted_emoji(&self, name: &str) {
        self.state.lock().unwrap().unlisted.insert(name.to_string());
    }

    pub fn add_folder(&self, name: &str, parent_id: Option<&str>) -> String {
        let mut state = self.state.lock().unwrap();
        let id = state.id("folder");
        state.folders.push(DriveFolder {
            id: id.clone(),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        });
        id
    }

    pub fn fail_next(&self, op: Op, err: MisskeyError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(op)
            .or_default()
            .push_back(err);
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .get(&op)
            .copied()
            .unwrap_or(0)
    }

    pub fn emoji_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.emojis.iter().map(|emoji| emoji.name.clone()).collect()
    }

    pub fn folders(&self) -> Vec<DriveFolder> {
        self.state.lock().unwrap().folders.clone()
    }

    pub fn files(&self) -> Vec<DriveFile> {
        self.state.lock().unwrap().files.clone()
    }
}

impl EmojiRegistry for FakeRegistry {
    async fn list_emojis(&self) -> Result<Vec<EmojiRecord>, MisskeyError> {
        let mut state = self.state.lock().unwrap();
        state.begin(Op::ListEmojis)?;
        Ok(state.emojis.clone())
    }

    async fn add_emoji(&self, emoji: &NewEmoji<'_>) -> Result<CreatedEmoji, MisskeyError> {
        let mut state = self.state.lock().unwrap();
        state.begin(Op::AddEmoji)?;
        if state.unlisted.contains(emoji.name)
            || state.emojis.iter().any(|existing| existing.name == emoji.name)
        {
            return Err(MisskeyError::duplicate_name());
        }
        if !state.files.iter().any(|file| file.id == emoji.file_id) {
            return Err(MisskeyError::api(ApiError::new("NO_SUCH_FILE", "No such file.")));
        }
        let id = state.id("emoji");
        state.emojis.push(EmojiRecord {
            name: emoji.name.to_string(),
            id: Some(id.clone()),
            file_id: Some(emoji.file_id.to_string()),
            category: emoji.category.map(str::to_string),
        });
        Ok(CreatedEmoji { id })
    }

    async fn list_folders(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<DriveFolder>, MisskeyError> {
        let mut state = self.state.lock().unwrap();
        state.begin(Op::ListFolders)?;
        Ok(state
            .folders
            .iter()
            .filter(|folder| folder.parent_id.as_deref() == parent_id)
            .cloned()
            .collect())
    }

    async fn show_folder(&self, folder_id: &str) -> Result<DriveFolder, MisskeyError> {
        let mut state = self.state.lock().unwrap();
        state.begin(Op::ShowFolder)?;
        state
            .folders
            .iter()
            .find(|folder| folder.id == folder_id)
            .cloned()
            .ok_or_else(|| {
                MisskeyError::api(ApiError::new("NO_SUCH_FOLDER", "No such folder."))
            })
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder, MisskeyError> {
        let mut state = self.state.lock().unwrap();
        state.begin(Op::CreateFolder)?;
        let folder = DriveFolder {
            id: state.id("folder"),
            name: name.to_string(),
            parent_id: parent_id.map(str::to_string),
        };
        state.folders.push(folder.clone());
        Ok(folder)
    }

    async fn upload_file(&self, upload: &FileUpload) -> Result<DriveFile, MisskeyError> {
        let mut state = self.state.lock().unwrap();
        state.begin(Op::UploadFile)?;
        let file = DriveFile {
            id: state.id("file"),
            name: upload.file_name.clone(),
            mime_type: Some(upload.mime_type.clone()),
            folder_id: upload.folder_id.clone(),
        };
        state.files.push(file.clone());
        Ok(file)
    }
}
