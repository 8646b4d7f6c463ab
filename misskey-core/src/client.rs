use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Largest page the drive folder listing accepts.
const FOLDER_LIST_LIMIT: u32 = 100;

const CODE_RATE_LIMIT_EXCEEDED: &str = "RATE_LIMIT_EXCEEDED";
const CODE_DUPLICATE_NAME: &str = "DUPLICATE_NAME";

#[derive(Debug, Error)]
pub enum MisskeyError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("api returned {status}: {error}")]
    Api { status: StatusCode, error: ApiError },
    #[error("api returned {status}: {body}")]
    Http { status: StatusCode, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorClass {
    Auth,
    RateLimit,
    DuplicateName,
    Permanent,
}

/// Error object Misskey puts under the `error` key of a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ApiError {
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            id: None,
        }
    }

    pub fn rate_limited() -> Self {
        Self::new(CODE_RATE_LIMIT_EXCEEDED, "Rate limit exceeded. Please try again later.")
    }

    pub fn duplicate_name() -> Self {
        Self::new(CODE_DUPLICATE_NAME, "Duplicate name.")
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.message)?;
        if let Some(id) = &self.id {
            write!(f, " [{id}]")?;
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct MisskeyClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl MisskeyClient {
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, MisskeyError> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MisskeyError> {
        Ok(Self {
            http: Client::builder().timeout(timeout).build()?,
            base_url: api_root(base_url)?,
            token: token.into(),
        })
    }

    pub async fn list_emojis(&self) -> Result<Vec<EmojiRecord>, MisskeyError> {
        let url = self.endpoint("api/emojis")?;
        tracing::debug!(%url, "listing custom emojis");
        let response = self.http.get(url).send().await?;
        let payload: EmojiList = Self::handle_response(response).await?;
        Ok(payload.emojis)
    }

    pub async fn add_emoji(&self, emoji: &NewEmoji<'_>) -> Result<CreatedEmoji, MisskeyError> {
        tracing::debug!(name = emoji.name, file_id = emoji.file_id, "adding emoji");
        self.post("api/admin/emoji/add", emoji).await
    }

    pub async fn list_folders(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<DriveFolder>, MisskeyError> {
        tracing::debug!(folder_id = ?parent_id, "listing drive folders");
        self.post(
            "api/drive/folders",
            &FolderListQuery {
                folder_id: parent_id,
                limit: FOLDER_LIST_LIMIT,
            },
        )
        .await
    }

    pub async fn show_folder(&self, folder_id: &str) -> Result<DriveFolder, MisskeyError> {
        tracing::debug!(folder_id, "showing drive folder");
        self.post("api/drive/folders/show", &FolderShowQuery { folder_id })
            .await
    }

    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<DriveFolder, MisskeyError> {
        tracing::debug!(name, parent_id = ?parent_id, "creating drive folder");
        self.post("api/drive/folders/create", &NewFolder { name, parent_id })
            .await
    }

    /// Reads `upload.path` and posts it as a multipart form. The file is
    /// read again on every call, so a retried upload sends fresh bytes.
    pub async fn upload_file(&self, upload: &FileUpload) -> Result<DriveFile, MisskeyError> {
        let url = self.endpoint("api/drive/files/create")?;
        let bytes = tokio::fs::read(&upload.path).await?;
        tracing::debug!(
            file = %upload.file_name,
            mime = %upload.mime_type,
            folder_id = ?upload.folder_id,
            size = bytes.len(),
            "uploading drive file"
        );
        let part = Part::bytes(bytes)
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime_type)?;
        let mut form = Form::new().text("i", self.token.clone());
        if let Some(folder_id) = &upload.folder_id {
            form = form.text("folderId", folder_id.clone());
        }
        let form = form.part("file", part);
        let response = self.http.post(url).multipart(form).send().await?;
        Self::handle_response(response).await
    }

    /// `path` is relative, so any path prefix of the instance url is kept.
    fn endpoint(&self, path: &str) -> Result<Url, MisskeyError> {
        Ok(self.base_url.join(path)?)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, MisskeyError>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url)
            .json(&Authenticated {
                i: &self.token,
                body,
            })
            .send()
            .await?;
        Self::handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, MisskeyError> {
        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => Err(MisskeyError::Api {
                    status,
                    error: envelope.error,
                }),
                Err(_) => Err(MisskeyError::Http { status, body }),
            }
        }
    }
}

impl MisskeyError {
    /// Wraps an error object the way the server would have answered it.
    pub fn api(error: ApiError) -> Self {
        let status = if error.code == CODE_RATE_LIMIT_EXCEEDED {
            StatusCode::TOO_MANY_REQUESTS
        } else {
            StatusCode::BAD_REQUEST
        };
        MisskeyError::Api { status, error }
    }

    pub fn rate_limited() -> Self {
        Self::api(ApiError::rate_limited())
    }

    pub fn duplicate_name() -> Self {
        Self::api(ApiError::duplicate_name())
    }

    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            MisskeyError::Api { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn classification(&self) -> Option<ApiErrorClass> {
        match self {
            MisskeyError::Api { status, error } => Some(classify(*status, Some(error))),
            MisskeyError::Http { status, .. } => Some(classify(*status, None)),
            _ => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.classification() == Some(ApiErrorClass::RateLimit)
    }

    pub fn is_duplicate_name(&self) -> bool {
        self.classification() == Some(ApiErrorClass::DuplicateName)
    }
}

fn classify(status: StatusCode, error: Option<&ApiError>) -> ApiErrorClass {
    match error.map(|error| error.code.as_str()) {
        Some(CODE_RATE_LIMIT_EXCEEDED) => ApiErrorClass::RateLimit,
        Some(CODE_DUPLICATE_NAME) => ApiErrorClass::DuplicateName,
        _ if status == StatusCode::TOO_MANY_REQUESTS => ApiErrorClass::RateLimit,
        _ if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
            ApiErrorClass::Auth
        }
        _ => ApiErrorClass::Permanent,
    }
}

#[derive(Serialize)]
struct Authenticated<'a, B: Serialize> {
    i: &'a str,
    #[serde(flatten)]
    body: &'a B,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FolderListQuery<'a> {
    folder_id: Option<&'a str>,
    limit: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FolderShowQuery<'a> {
    folder_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewFolder<'a> {
    name: &'a str,
    parent_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct EmojiList {
    emojis: Vec<EmojiRecord>,
}

/// Request body of `admin/emoji/add`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmoji<'a> {
    pub name: &'a str,
    pub file_id: &'a str,
    pub category: Option<&'a str>,
    pub license: Option<&'a str>,
    pub is_sensitive: bool,
    pub local_only: bool,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime_type: String,
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmojiRecord {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CreatedEmoji {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFolder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub folder_id: Option<String>,
}

/// Parses the instance url and makes its path end in `/` so relative
/// endpoint paths join below it.
fn api_root(base_url: &str) -> Result<Url, MisskeyError> {
    let mut url = Url::parse(base_url)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
