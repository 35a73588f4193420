use crate::email::{Email, Folder, FolderFilter, Role};
use crate::store::EmailStore;

/// The three inputs the list view is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewQuery {
    pub filter: FolderFilter,
    pub search: String,
    pub role: Role,
}

impl ViewQuery {
    pub fn new(filter: FolderFilter, search: &str, role: Role) -> Self {
        Self {
            filter,
            search: search.to_string(),
            role,
        }
    }
}

/// Records visible for `query`, in store order.
///
/// A record is kept when it is in the selected folder (or the filter is
/// `All`), the search text occurs in its subject, sender or content, and its
/// role equals the query role. The role check is never relaxed.
pub fn project<'a>(store: &'a EmailStore, query: &ViewQuery) -> Vec<&'a Email> {
    let needle = query.search.to_lowercase();
    store
        .iter()
        .filter(|email| {
            query.filter.matches(email.folder)
                && email.matches_search(&needle)
                && email.role == query.role
        })
        .collect()
}

/// Unread Inbox records for `role`. Folder filter and search do not apply.
pub fn unread_count(store: &EmailStore, role: Role) -> usize {
    store
        .iter()
        .filter(|email| email.role == role && email.folder == Folder::Inbox && !email.read)
        .count()
}

/// Records for `role` in the `filter` bucket, ignoring search.
pub fn folder_count(store: &EmailStore, role: Role, filter: FolderFilter) -> usize {
    store
        .iter()
        .filter(|email| email.role == role && filter.matches(email.folder))
        .count()
}
