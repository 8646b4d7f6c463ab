mod client;

pub use client::{
    ApiError, ApiErrorClass, CreatedEmoji, DriveFile, DriveFolder, EmojiRecord, FileUpload,
    MisskeyClient, MisskeyError, NewEmoji,
};
