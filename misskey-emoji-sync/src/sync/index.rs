use std::collections::HashMap;

use misskey_core::EmojiRecord;

use super::executor::{ExecuteError, RequestExecutor};
use super::registry::EmojiRegistry;

/// Names of the emojis that existed when the run started.
///
/// Built from a single listing and never refreshed. Emojis created later in
/// the same run are caught by the server's duplicate-name rejection instead.
/// If the instance ever pages its emoji listing, only the first page is seen.
#[derive(Debug, Default)]
pub struct RemoteStateIndex {
    emojis: HashMap<String, EmojiRecord>,
}

impl RemoteStateIndex {
    pub async fn fetch<R: EmojiRegistry>(
        registry: &R,
        executor: &RequestExecutor,
    ) -> Result<Self, ExecuteError> {
        let records = executor
            .execute("list emojis", || registry.list_emojis())
            .await?;
        let index = Self::from_records(records);
        tracing::debug!(count = index.len(), "fetched existing emojis");
        Ok(index)
    }

    pub fn from_records(records: impl IntoIterator<Item = EmojiRecord>) -> Self {
        Self {
            emojis: records
                .into_iter()
                .map(|record| (record.name.clone(), record))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.emojis.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&EmojiRecord> {
        self.emojis.get(name)
    }

    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }
}
