use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::email::{sample_emails, Email, Folder};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No email with id {0}")]
    NotFound(u32),

    #[error("Duplicate email id {0} in seed set")]
    DuplicateId(u32),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Immutable snapshot of the record list.
///
/// Every mutation returns a new store; a clone shares the snapshot, so a
/// handle taken before a mutation keeps seeing the old records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailStore {
    emails: Arc<[Email]>,
}

impl EmailStore {
    /// Builds a store, rejecting seed sets where two records share an id.
    pub fn new(emails: Vec<Email>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(emails.len());
        for email in &emails {
            if !seen.insert(email.id) {
                return Err(StoreError::DuplicateId(email.id));
            }
        }

        Ok(Self {
            emails: emails.into(),
        })
    }

    pub fn with_sample_data() -> Self {
        Self {
            emails: sample_emails().into(),
        }
    }

    /// Loads a seed set from a JSON array of records.
    pub fn from_json_file(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path)?;
        let emails: Vec<Email> = serde_json::from_str(&content)?;
        log::info!("Loaded {} seed emails from {}", emails.len(), path.display());
        Self::new(emails)
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Email> {
        self.emails.iter()
    }

    pub fn as_slice(&self) -> &[Email] {
        &self.emails
    }

    pub fn get(&self, id: u32) -> Option<&Email> {
        self.emails.iter().find(|email| email.id == id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.get(id).is_some()
    }

    /// Returns a store where `id` is marked read. Unknown ids and records that
    /// are already read yield an equal copy.
    pub fn mark_read(&self, id: u32) -> EmailStore {
        log::debug!("mark_read({})", id);
        self.replace_where(id, |email| {
            if !email.read {
                email.read = true;
            }
        })
    }

    /// Returns a store where `id` lives in `folder`. Unknown ids yield an
    /// equal copy.
    pub fn move_folder(&self, id: u32, folder: Folder) -> EmailStore {
        log::debug!("move_folder({}, {})", id, folder);
        self.replace_where(id, |email| email.folder = folder)
    }

    /// Like [`EmailStore::mark_read`] but reports an unknown id.
    pub fn try_mark_read(&self, id: u32) -> Result<EmailStore, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id));
        }
        Ok(self.mark_read(id))
    }

    /// Like [`EmailStore::move_folder`] but reports an unknown id.
    pub fn try_move_folder(&self, id: u32, folder: Folder) -> Result<EmailStore, StoreError> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id));
        }
        Ok(self.move_folder(id, folder))
    }

    fn replace_where<F>(&self, id: u32, update: F) -> EmailStore
    where
        F: Fn(&mut Email),
    {
        let emails: Vec<Email> = self
            .emails
            .iter()
            .map(|email| {
                let mut copy = email.clone();
                if copy.id == id {
                    update(&mut copy);
                }
                copy
            })
            .collect();

        EmailStore {
            emails: emails.into(),
        }
    }
}

impl Default for EmailStore {
    fn default() -> Self {
        Self::with_sample_data()
    }
}

impl<'a> IntoIterator for &'a EmailStore {
    type Item = &'a Email;
    type IntoIter = std::slice::Iter<'a, Email>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mark_read_is_idempotent() {
        let store = EmailStore::with_sample_data();
        let once = store.mark_read(1);
        let twice = once.mark_read(1);
        assert_eq!(once, twice);
        assert!(once.get(1).unwrap().read);
        assert!(!store.get(1).unwrap().read, "old snapshot must not change");
    }

    #[test]
    fn test_move_folder_touches_only_target() {
        let store = EmailStore::with_sample_data();
        let moved = store.move_folder(4, Folder::Archived);
        for (before, after) in store.iter().zip(moved.iter()) {
            if before.id == 4 {
                assert_eq!(after.folder, Folder::Archived);
                assert_eq!(after.read, before.read);
            } else {
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_unknown_id_is_silent() {
        let store = EmailStore::with_sample_data();
        assert_eq!(store.mark_read(99), store);
        assert_eq!(store.move_folder(99, Folder::Spam), store);
    }

    #[test]
    fn test_strict_variants_report_not_found() {
        let store = EmailStore::with_sample_data();
        assert!(matches!(store.try_mark_read(42), Err(StoreError::NotFound(42))));
        assert!(matches!(
            store.try_move_folder(42, Folder::Inbox),
            Err(StoreError::NotFound(42))
        ));
        let moved = store.try_move_folder(2, Folder::Inbox).unwrap();
        assert_eq!(moved.get(2).unwrap().folder, Folder::Inbox);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut emails = sample_emails();
        emails.push(emails[0].clone());
        assert!(matches!(EmailStore::new(emails), Err(StoreError::DuplicateId(1))));
    }

    #[test]
    fn test_order_is_preserved() {
        let store = EmailStore::with_sample_data().move_folder(3, Folder::Inbox);
        let ids: Vec<u32> = store.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&sample_emails()[..2]).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let store = EmailStore::from_json_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(2).unwrap().folder, Folder::Spam);
    }

    #[test]
    fn test_from_json_file_bad_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        assert!(matches!(
            EmailStore::from_json_file(file.path()),
            Err(StoreError::Parse(_))
        ));
    }
}
