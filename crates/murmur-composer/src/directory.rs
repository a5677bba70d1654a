//! User directory port and an in-memory implementation.

use serde::{Deserialize, Serialize};

use crate::error::LookupError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub user_id: i64,
    pub user_name_complete: String,
}

impl DirectoryEntry {
    pub fn new(user_id: i64, user_name_complete: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name_complete: user_name_complete.into(),
        }
    }
}

/// Source of mention candidates.
pub trait DirectoryQuery {
    /// Entries whose name contains `query`, in directory order.
    fn search(&self, query: &str) -> Result<Vec<DirectoryEntry>, LookupError>;
}

impl<T: DirectoryQuery + ?Sized> DirectoryQuery for &T {
    fn search(&self, query: &str) -> Result<Vec<DirectoryEntry>, LookupError> {
        (**self).search(query)
    }
}

/// Directory kept sorted by name. Entries with blank names are dropped.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    entries: Vec<DirectoryEntry>,
}

impl UserDirectory {
    pub fn new(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
        let mut entries: Vec<_> = entries
            .into_iter()
            .filter(|e| !e.user_name_complete.trim().is_empty())
            .collect();
        entries.sort_by(|a, b| a.user_name_complete.cmp(&b.user_name_complete));
        Self { entries }
    }

    /// Load from a JSON array of `{userId, userNameComplete}` objects.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<DirectoryEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DirectoryQuery for UserDirectory {
    fn search(&self, query: &str) -> Result<Vec<DirectoryEntry>, LookupError> {
        let needle = query.to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|e| e.user_name_complete.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
