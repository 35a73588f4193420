pub mod app;
pub mod config;
pub mod email;
pub mod filter;
pub mod store;
pub mod ui;

// Re-export commonly used types
pub use app::{App, AppError, AppMode, AppResult, Selection};
pub use config::{Config, UIConfig};
pub use email::{Email, Folder, FolderFilter, Role};
pub use filter::{project, unread_count, ViewQuery};
pub use store::{EmailStore, StoreError};
