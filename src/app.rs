use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

use crate::config::{Config, UIConfig};
use crate::email::{Email, Folder, FolderFilter, Role};
use crate::filter::{self, ViewQuery};
use crate::store::{EmailStore, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Loading,
    Normal,
    Search,
    Help,
}

/// Detail overlay state. The record is the snapshot taken when it was opened.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    NoSelection,
    Selected(Email),
}

impl Selection {
    pub fn email(&self) -> Option<&Email> {
        match self {
            Selection::NoSelection => None,
            Selection::Selected(email) => Some(email),
        }
    }

    pub fn is_selected(&self) -> bool {
        matches!(self, Selection::Selected(_))
    }
}

/// One-shot delay in front of the main view. Dropping it before the deadline
/// means the main view is simply never revealed by it.
#[derive(Debug, Clone, Copy)]
pub struct StartupGate {
    deadline: Instant,
}

impl StartupGate {
    pub fn new(now: Instant, delay: Duration) -> Self {
        Self {
            deadline: now + delay,
        }
    }

    pub fn is_elapsed(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

pub struct App {
    pub ui_config: UIConfig,
    pub store: EmailStore,
    pub should_quit: bool,
    pub mode: AppMode,

    // View inputs
    pub filter: FolderFilter,
    pub search: String,
    pub role: Role,

    // List cursor, an index into the current projection
    pub selected_email_idx: Option<usize>,
    pub selection: Selection,
    pub detail_scroll: u16,

    pub startup: Option<StartupGate>,

    pub error_message: Option<String>,
    pub info_message: Option<String>,
    pub message_timeout: Option<Instant>,
}

impl App {
    pub fn new(store: EmailStore, role: Role, filter: FolderFilter, ui_config: UIConfig) -> Self {
        let delay = ui_config.loading_delay();
        let (mode, startup) = if delay.is_zero() {
            (AppMode::Normal, None)
        } else {
            (AppMode::Loading, Some(StartupGate::new(Instant::now(), delay)))
        };

        let mut app = Self {
            ui_config,
            store,
            should_quit: false,
            mode,
            filter,
            search: String::new(),
            role,
            selected_email_idx: None,
            selection: Selection::NoSelection,
            detail_scroll: 0,
            startup,
            error_message: None,
            info_message: None,
            message_timeout: None,
        };
        app.reset_cursor();
        log::info!("App started with {} emails, role {}", app.store.len(), app.role);
        app
    }

    /// Builds the app from the configured seed set.
    pub fn from_config(config: &Config, role: Role) -> AppResult<Self> {
        let store = config.load_store()?;
        Ok(Self::new(store, role, config.default_filter, config.ui.clone()))
    }

    pub fn query(&self) -> ViewQuery {
        ViewQuery::new(self.filter, &self.search, self.role)
    }

    /// Current projection. Recomputed on every call.
    pub fn visible_emails(&self) -> Vec<&Email> {
        filter::project(&self.store, &self.query())
    }

    pub fn unread_count(&self) -> usize {
        filter::unread_count(&self.store, self.role)
    }

    pub fn folder_count(&self, filter: FolderFilter) -> usize {
        filter::folder_count(&self.store, self.role, filter)
    }

    pub fn is_loading(&self) -> bool {
        self.mode == AppMode::Loading
    }

    pub fn cursor_email(&self) -> Option<&Email> {
        let idx = self.selected_email_idx?;
        self.visible_emails().get(idx).copied()
    }

    // View input commands

    pub fn set_filter(&mut self, filter: FolderFilter) {
        if self.filter != filter {
            log::debug!("Filter changed to {}", filter);
            self.filter = filter;
            self.reset_cursor();
        }
    }

    pub fn set_role(&mut self, role: Role) {
        if self.role != role {
            log::debug!("Role changed to {}", role);
            self.role = role;
            self.reset_cursor();
        }
    }

    pub fn switch_role(&mut self) {
        self.set_role(self.role.toggled());
        self.show_info(&format!("Viewing as {}", self.role));
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.reset_cursor();
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
        self.reset_cursor();
    }

    pub fn pop_search_char(&mut self) {
        if self.search.pop().is_some() {
            self.reset_cursor();
        }
    }

    pub fn select_next_email(&mut self) {
        let len = self.visible_emails().len();
        if len == 0 {
            self.selected_email_idx = None;
            return;
        }

        self.selected_email_idx = match self.selected_email_idx {
            Some(idx) if idx + 1 < len => Some(idx + 1),
            Some(idx) => Some(idx),
            None => Some(0),
        };
    }

    pub fn select_prev_email(&mut self) {
        let len = self.visible_emails().len();
        if len == 0 {
            self.selected_email_idx = None;
            return;
        }

        self.selected_email_idx = match self.selected_email_idx {
            Some(idx) => Some(idx.saturating_sub(1)),
            None => Some(0),
        };
    }

    pub fn select_last_email(&mut self) {
        self.selected_email_idx = self.visible_emails().len().checked_sub(1);
    }

    fn reset_cursor(&mut self) {
        self.selected_email_idx = if self.visible_emails().is_empty() {
            None
        } else {
            Some(0)
        };
    }

    // Keeps the cursor on a valid row after the projection shrank.
    fn clamp_cursor(&mut self) {
        let len = self.visible_emails().len();
        self.selected_email_idx = match (self.selected_email_idx, len) {
            (_, 0) => None,
            (Some(idx), len) => Some(idx.min(len - 1)),
            (None, _) => Some(0),
        };
    }

    // Selection state machine

    /// Opens `id` in the detail view and marks it read. Only records in the
    /// current projection can be opened, and only when nothing is open.
    pub fn open_email(&mut self, id: u32) -> bool {
        if self.selection.is_selected() {
            log::warn!("Ignoring open of {} while a record is already open", id);
            return false;
        }

        let Some(email) = self.visible_emails().into_iter().find(|e| e.id == id).cloned() else {
            log::debug!("Email {} is not in the current view", id);
            return false;
        };

        self.store = self.store.mark_read(id);
        self.selection = Selection::Selected(email);
        self.detail_scroll = 0;
        log::debug!("Opened email {}", id);
        true
    }

    pub fn open_selected_email(&mut self) -> bool {
        match self.cursor_email().map(|e| e.id) {
            Some(id) => self.open_email(id),
            None => {
                self.show_error("No email selected");
                false
            }
        }
    }

    pub fn close_detail(&mut self) {
        if let Selection::Selected(email) = &self.selection {
            log::debug!("Closed email {}", email.id);
        }
        self.selection = Selection::NoSelection;
        self.detail_scroll = 0;
    }

    /// Moves the open record to `folder` and closes the detail view.
    pub fn move_selected_email(&mut self, folder: Folder) -> bool {
        let Some(id) = self.selection.email().map(|e| e.id) else {
            return false;
        };

        self.store = self.store.move_folder(id, folder);
        self.close_detail();
        self.clamp_cursor();
        self.show_info(&format!("Moved to {}", folder));
        true
    }

    pub fn archive_selected_email(&mut self) -> bool {
        self.move_selected_email(Folder::Archived)
    }

    /// "Mark as Spam" for records outside Spam, "Not Spam" (back to Inbox)
    /// for records in Spam.
    pub fn toggle_spam_selected_email(&mut self) -> bool {
        match self.selection.email().map(|e| e.folder) {
            Some(Folder::Spam) => self.move_selected_email(Folder::Inbox),
            Some(_) => self.move_selected_email(Folder::Spam),
            None => false,
        }
    }

    // Input handling

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.selection.is_selected() {
            self.handle_detail_mode(key);
            return;
        }

        match self.mode {
            AppMode::Loading => self.handle_loading_mode(key),
            AppMode::Normal => self.handle_normal_mode(key),
            AppMode::Search => self.handle_search_mode(key),
            AppMode::Help => self.handle_help_mode(key),
        }
    }

    fn handle_loading_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('u') => self.switch_role(),
            _ => {}
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
            }
            KeyCode::Char('/') => {
                self.mode = AppMode::Search;
            }
            KeyCode::Char(c @ '1'..='4') => {
                let idx = (c as usize) - ('1' as usize);
                self.set_filter(FolderFilter::CHOICES[idx]);
            }
            KeyCode::Tab => self.set_filter(self.filter.next()),
            KeyCode::BackTab => self.set_filter(self.filter.prev()),
            KeyCode::Char('u') => self.switch_role(),
            KeyCode::Up | KeyCode::Char('k') => self.select_prev_email(),
            KeyCode::Down | KeyCode::Char('j') => self.select_next_email(),
            KeyCode::Home | KeyCode::Char('g') => self.reset_cursor(),
            KeyCode::End | KeyCode::Char('G') => self.select_last_email(),
            KeyCode::Enter => {
                self.open_selected_email();
            }
            KeyCode::Char('?') => {
                self.mode = AppMode::Help;
            }
            KeyCode::Esc if !self.search.is_empty() => self.set_search(""),
            _ => {}
        }
    }

    fn handle_search_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
            }
            KeyCode::Esc => {
                self.set_search("");
                self.mode = AppMode::Normal;
            }
            KeyCode::Backspace => self.pop_search_char(),
            KeyCode::Up => self.select_prev_email(),
            KeyCode::Down => self.select_next_email(),
            KeyCode::Char(c) => self.push_search_char(c),
            _ => {}
        }
    }

    fn handle_detail_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.close_detail(),
            KeyCode::Char('a') => {
                self.archive_selected_email();
            }
            KeyCode::Char('s') => {
                self.toggle_spam_selected_email();
            }
            KeyCode::Up => self.detail_scroll = self.detail_scroll.saturating_sub(1),
            KeyCode::Down => self.detail_scroll = self.detail_scroll.saturating_add(1),
            _ => {}
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.mode = AppMode::Normal;
            }
            _ => {}
        }
    }

    pub fn show_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
        self.info_message = None;
        self.message_timeout = Some(Instant::now() + Duration::from_secs(5));
    }

    pub fn show_info(&mut self, message: &str) {
        self.info_message = Some(message.to_string());
        self.error_message = None;
        self.message_timeout = Some(Instant::now() + Duration::from_secs(3));
    }

    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Clears expired status messages and lifts the startup gate.
    pub fn tick_at(&mut self, now: Instant) {
        if let Some(timeout) = self.message_timeout {
            if now > timeout {
                self.error_message = None;
                self.info_message = None;
                self.message_timeout = None;
            }
        }

        if let Some(gate) = self.startup {
            if gate.is_elapsed(now) {
                self.startup = None;
                if self.mode == AppMode::Loading {
                    self.mode = AppMode::Normal;
                }
                self.reset_cursor();
                log::debug!("Startup delay elapsed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let ui = UIConfig {
            loading_delay_ms: 0,
            ..UIConfig::default()
        };
        App::new(EmailStore::with_sample_data(), Role::User, FolderFilter::All, ui)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn visible_ids(app: &App) -> Vec<u32> {
        app.visible_emails().iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_startup_gate() {
        let ui = UIConfig::default();
        let mut app = App::new(EmailStore::with_sample_data(), Role::User, FolderFilter::All, ui);
        assert!(app.is_loading());

        // Navigation is ignored while loading
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.filter, FolderFilter::All);

        app.tick_at(Instant::now() + Duration::from_millis(1500));
        assert!(!app.is_loading());
        assert!(app.startup.is_none());
    }

    #[test]
    fn test_from_config_reports_missing_seed() {
        let config = Config {
            seed_file: Some("/nonexistent/securemail-seed.json".to_string()),
            ..Config::default()
        };
        assert!(matches!(
            App::from_config(&config, Role::User),
            Err(AppError::StoreError(StoreError::Io(_)))
        ));

        let app = App::from_config(&Config::default(), Role::Admin).unwrap();
        assert_eq!(app.role, Role::Admin);
        assert_eq!(app.store.len(), 7);
    }

    #[test]
    fn test_zero_delay_skips_loading() {
        assert_eq!(app().mode, AppMode::Normal);
    }

    #[test]
    fn test_open_marks_read_once() {
        let mut app = app();
        assert_eq!(app.unread_count(), 2);

        assert!(app.open_email(1));
        assert!(app.store.get(1).unwrap().read);
        assert_eq!(app.unread_count(), 1);
        // Snapshot shows the record as it was when chosen
        assert!(!app.selection.email().unwrap().read);

        app.close_detail();
        assert!(app.open_email(1));
        assert!(app.store.get(1).unwrap().read);
        assert_eq!(app.unread_count(), 1);
    }

    #[test]
    fn test_cannot_open_hidden_or_while_open() {
        let mut app = app();
        // id 4 belongs to Admin
        assert!(!app.open_email(4));
        assert!(!app.store.get(4).unwrap().read);

        assert!(app.open_email(5));
        assert!(!app.open_email(1));
        assert_eq!(app.selection.email().unwrap().id, 5);
    }

    #[test]
    fn test_not_spam_moves_to_inbox_and_closes() {
        let mut app = app();
        app.set_role(Role::Admin);
        app.set_filter(Folder::Spam.into());
        assert_eq!(visible_ids(&app), vec![2]);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selection.email().unwrap().id, 2);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(app.store.get(2).unwrap().folder, Folder::Inbox);
        assert_eq!(app.selection, Selection::NoSelection);
        assert!(visible_ids(&app).is_empty());
        assert_eq!(app.selected_email_idx, None);
    }

    #[test]
    fn test_mark_spam_and_archive() {
        let mut app = app();
        assert!(app.open_email(5));
        assert!(app.toggle_spam_selected_email());
        assert_eq!(app.store.get(5).unwrap().folder, Folder::Spam);
        assert!(!app.selection.is_selected());

        assert!(app.open_email(6));
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.store.get(6).unwrap().folder, Folder::Archived);
        assert!(!app.selection.is_selected());

        // Nothing open: commands are no-ops
        assert!(!app.archive_selected_email());
        assert!(!app.toggle_spam_selected_email());
    }

    #[test]
    fn test_search_mode_typing() {
        let mut app = app();
        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.mode, AppMode::Search);
        for c in "repo".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        assert_eq!(visible_ids(&app), vec![3]);

        // "rep" also hits id 1's sender (noreply@) and id 5's content (prepare)
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.search, "rep");
        assert_eq!(visible_ids(&app), vec![1, 3, 5]);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.search.is_empty());
        assert_eq!(visible_ids(&app), vec![1, 3, 5, 6]);
    }

    #[test]
    fn test_filter_keys_and_role_switch() {
        let mut app = app();
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.filter, FolderFilter::Only(Folder::Inbox));
        assert_eq!(visible_ids(&app), vec![1, 5, 6]);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, FolderFilter::Only(Folder::Spam));

        press(&mut app, KeyCode::Char('1'));
        press(&mut app, KeyCode::Char('u'));
        assert_eq!(app.role, Role::Admin);
        assert_eq!(visible_ids(&app), vec![2, 4, 7]);
        assert_eq!(app.unread_count(), 2);
    }

    #[test]
    fn test_unread_badge_ignores_filter_and_search() {
        let mut app = app();
        assert_eq!(app.unread_count(), 2);

        app.set_filter(Folder::Spam.into());
        app.set_search("zzz");
        assert!(app.visible_emails().is_empty());
        assert_eq!(app.unread_count(), 2);

        app.set_filter(FolderFilter::All);
        app.set_search("");
        assert!(app.open_email(1));
        app.close_detail();

        app.set_filter(Folder::Archived.into());
        app.set_search("report");
        assert_eq!(visible_ids(&app), vec![3]);
        assert_eq!(app.unread_count(), 1);
    }

    #[test]
    fn test_cursor_navigation() {
        let mut app = app();
        assert_eq!(app.selected_email_idx, Some(0));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor_email().unwrap().id, 5);
        press(&mut app, KeyCode::End);
        assert_eq!(app.cursor_email().unwrap().id, 6);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.cursor_email().unwrap().id, 6);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.cursor_email().unwrap().id, 5);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.selection.email().unwrap().id, 5);
        press(&mut app, KeyCode::Esc);
        assert!(!app.selection.is_selected());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = self::app();
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_messages_expire() {
        let mut app = app();
        app.show_error("boom");
        assert!(app.error_message.is_some());
        app.tick_at(Instant::now() + Duration::from_secs(10));
        assert!(app.error_message.is_none());
        assert!(app.message_timeout.is_none());
    }
}
