use std::future::Future;

use misskey_core::{
    CreatedEmoji, DriveFile, DriveFolder, EmojiRecord, FileUpload, MisskeyClient, MisskeyError,
    NewEmoji,
};

/// The remote operations the sync engine consumes. Implemented by
/// [`MisskeyClient`]; tests substitute in-memory registries.
pub trait EmojiRegistry {
    fn list_emojis(&self) -> impl Future<Output = Result<Vec<EmojiRecord>, MisskeyError>>;

    fn add_emoji(
        &self,
        emoji: &NewEmoji<'_>,
    ) -> impl Future<Output = Result<CreatedEmoji, MisskeyError>>;

    fn list_folders(
        &self,
        parent_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<DriveFolder>, MisskeyError>>;

    fn show_folder(
        &self,
        folder_id: &str,
    ) -> impl Future<Output = Result<DriveFolder, MisskeyError>>;

    fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> impl Future<Output = Result<DriveFolder, MisskeyError>>;

    fn upload_file(
        &self,
        upload: &FileUpload,
    ) -> impl Future<Output = Result<DriveFile, MisskeyError>>;
}

impl EmojiRegistry for MisskeyClient {
    async fn list_emojis(&self) -> Result<Vec<EmojiRecord>, MisskeyError> {
        MisskeyClient::list_emojis(self).await
    }

    async fn add_emoji(&self, emoji: &NewEmoji<'_>) -> Result<CreatedEmoji, MisskeyError> {
        MisskeyClient::add_emoji(self, emoji).await
    }

    async fn list_folders(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<DriveFolder>, MisskeyError> {
        MisskeyClient::list_folders(self, parent_id).await
    }

    async fn show_folder(&self, folder_id: &str) -> Result<DriveFolder, MisskeyError> {
        MisskeyClient::show_folder(self, folder_id).await
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder, MisskeyError> {
        MisskeyClient::create_folder(self, name, parent_id).await
    }

    async fn upload_file(&self, upload: &FileUpload) -> Result<DriveFile, MisskeyError> {
        MisskeyClient::upload_file(self, upload).await
    }
}
