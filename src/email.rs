use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    #[error("Unknown folder: {0}")]
    UnknownFolder(String),

    #[error("Unknown role: {0}")]
    UnknownRole(String),
}

/// The three mutually exclusive buckets a record can live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Folder {
    Inbox,
    Spam,
    Archived,
}

impl Folder {
    pub const ALL: [Folder; 3] = [Folder::Inbox, Folder::Spam, Folder::Archived];

    pub fn as_str(&self) -> &'static str {
        match self {
            Folder::Inbox => "Inbox",
            Folder::Spam => "Spam",
            Folder::Archived => "Archived",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Folder {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inbox" => Ok(Folder::Inbox),
            "spam" => Ok(Folder::Spam),
            "archived" | "archive" => Ok(Folder::Archived),
            _ => Err(ParseEnumError::UnknownFolder(s.to_string())),
        }
    }
}

/// Visibility partition for the list view. This is not a permission system:
/// it only decides which records are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn toggled(self) -> Self {
        match self {
            Role::Admin => Role::User,
            Role::User => Role::Admin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(ParseEnumError::UnknownRole(s.to_string())),
        }
    }
}

/// Folder selection in the sidebar: everything, or a single folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "String", try_from = "String")]
pub enum FolderFilter {
    #[default]
    All,
    Only(Folder),
}

impl FolderFilter {
    /// Sidebar order.
    pub const CHOICES: [FolderFilter; 4] = [
        FolderFilter::All,
        FolderFilter::Only(Folder::Inbox),
        FolderFilter::Only(Folder::Spam),
        FolderFilter::Only(Folder::Archived),
    ];

    pub fn matches(&self, folder: Folder) -> bool {
        match self {
            FolderFilter::All => true,
            FolderFilter::Only(f) => *f == folder,
        }
    }

    pub fn index(&self) -> usize {
        Self::CHOICES
            .iter()
            .position(|choice| choice == self)
            .unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::CHOICES[(self.index() + 1) % Self::CHOICES.len()]
    }

    pub fn prev(self) -> Self {
        let len = Self::CHOICES.len();
        Self::CHOICES[(self.index() + len - 1) % len]
    }
}

impl fmt::Display for FolderFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FolderFilter::All => f.write_str("All"),
            FolderFilter::Only(folder) => f.write_str(folder.as_str()),
        }
    }
}

impl FromStr for FolderFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(FolderFilter::All);
        }
        s.parse().map(FolderFilter::Only)
    }
}

impl From<FolderFilter> for String {
    fn from(filter: FolderFilter) -> Self {
        filter.to_string()
    }
}

impl TryFrom<String> for FolderFilter {
    type Error = ParseEnumError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Folder> for FolderFilter {
    fn from(folder: Folder) -> Self {
        FolderFilter::Only(folder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: u32,
    pub subject: String,
    pub sender: String,
    pub content: String,
    #[serde(with = "timestamp_serde")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub read: bool,
    pub folder: Folder,
    pub role: Role,
}

// Timestamps are stored as local wall-clock strings, e.g. 2025-04-30T10:23:00
mod timestamp_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S>(dt: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&dt.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

impl Email {
    pub fn new(id: u32, subject: &str, sender: &str, content: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            id,
            subject: subject.to_string(),
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp,
            read: false,
            folder: Folder::Inbox,
            role: Role::User,
        }
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folder = folder;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    pub fn with_read(mut self, read: bool) -> Self {
        self.read = read;
        self
    }

    /// Case-insensitive substring match against subject, sender and content.
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.subject.to_lowercase().contains(needle)
            || self.sender.to_lowercase().contains(needle)
            || self.content.to_lowercase().contains(needle)
    }

    /// First `max_chars` characters of the body, for the list preview.
    pub fn preview(&self, max_chars: usize) -> String {
        self.content.chars().take(max_chars).collect()
    }
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, timestamp_serde::FORMAT).unwrap_or_default()
}

/// The built-in record set loaded at startup when no seed file is configured.
pub fn sample_emails() -> Vec<Email> {
    vec![
        Email::new(
            1,
            "Welcome to SecureMail!",
            "noreply@securemail.com",
            "Thank you for signing up to SecureMail. We're excited to have you on board!",
            at("2025-04-30T10:23:00"),
        ),
        Email::new(
            2,
            "Security Update",
            "admin@securemail.com",
            "We have updated our security protocols. Please review the changes.",
            at("2025-04-29T14:15:00"),
        )
        .with_read(true)
        .with_folder(Folder::Spam)
        .with_role(Role::Admin),
        Email::new(
            3,
            "Monthly Report",
            "hr@company.com",
            "Please find attached the monthly activity report for April 2025.",
            at("2025-04-28T09:45:00"),
        )
        .with_read(true)
        .with_folder(Folder::Archived),
        Email::new(
            4,
            "Password Change Required",
            "security@securemail.com",
            "Your password will expire in 3 days. Please update it at your earliest convenience.",
            at("2025-04-30T08:30:00"),
        )
        .with_role(Role::Admin),
        Email::new(
            5,
            "Team Meeting - May 2nd",
            "manager@company.com",
            "Reminder: We have our team sync on Friday at 10AM. Please prepare your updates.",
            at("2025-04-30T11:20:00"),
        ),
        Email::new(
            6,
            "Your Account Statement",
            "billing@securemail.com",
            "Your monthly account statement is now available for download.",
            at("2025-04-27T16:05:00"),
        )
        .with_read(true),
        Email::new(
            7,
            "System Maintenance Notice",
            "system@securemail.com",
            "The system will be undergoing maintenance on May 5th from 1AM to 3AM UTC.",
            at("2025-04-29T18:45:00"),
        )
        .with_role(Role::Admin),
    ]
}
