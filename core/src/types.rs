//! Domain DTOs for the QuestLog API.
//!
//! # Design
//! These types mirror the backend's JSON schema but are defined
//! independently from the mock-server crate; integration tests catch schema
//! drift. Category and priority decode leniently: an unknown or missing
//! value becomes `None`, and display code falls back to `Other` / `Medium`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ApiError;

/// The signed-in player.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub xp: u64,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub streak: u32,
    #[serde(default)]
    pub rank: String,
}

fn default_level() -> u32 {
    1
}

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<Category>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

impl Todo {
    pub fn category_or_default(&self) -> Category {
        self.category.unwrap_or_default()
    }

    pub fn priority_or_default(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

/// Decode an optional enum from a string, mapping unknown values to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

/// Display metadata for an enumerated todo attribute.
pub trait Badge: Copy + 'static {
    const ALL: &'static [Self];

    fn id(self) -> &'static str;
    fn label(self) -> &'static str;
    fn color(self) -> &'static str;
    fn icon(self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Personal,
    Work,
    Shopping,
    Health,
    Study,
    #[default]
    Other,
}

impl Badge for Category {
    const ALL: &'static [Self] = &[
        Category::Personal,
        Category::Work,
        Category::Shopping,
        Category::Health,
        Category::Study,
        Category::Other,
    ];

    fn id(self) -> &'static str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Study => "study",
            Category::Other => "other",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Category::Personal => "Personal",
            Category::Work => "Work",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Study => "Study",
            Category::Other => "Other",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Category::Personal => "#8B5CF6",
            Category::Work => "#3B82F6",
            Category::Shopping => "#F59E0B",
            Category::Health => "#10B981",
            Category::Study => "#EC4899",
            Category::Other => "#6B7280",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Category::Personal => "account",
            Category::Work => "briefcase",
            Category::Shopping => "cart",
            Category::Health => "heart-pulse",
            Category::Study => "book-open-variant",
            Category::Other => "dots-horizontal",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Badge for Priority {
    const ALL: &'static [Self] = &[Priority::High, Priority::Medium, Priority::Low];

    fn id(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Priority::High => "#EF4444",
            Priority::Medium => "#F59E0B",
            Priority::Low => "#10B981",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Priority::High => "chevron-double-up",
            Priority::Medium => "equal",
            Priority::Low => "chevron-down",
        }
    }
}

/// Returned when a string names no known category or priority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {0}")]
pub struct UnknownBadge(pub String);

fn parse_badge<T: Badge>(s: &str) -> Result<T, UnknownBadge> {
    T::ALL
        .iter()
        .copied()
        .find(|b| b.id().eq_ignore_ascii_case(s))
        .ok_or_else(|| UnknownBadge(s.to_string()))
}

impl FromStr for Category {
    type Err = UnknownBadge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_badge(s)
    }
}

impl FromStr for Priority {
    type Err = UnknownBadge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_badge(s)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Reject a blank title before anything is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.title.trim().is_empty() {
            return Err(ApiError::Validation(
                "Please enter a title for your todo".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial update for an existing todo. Only the fields present in the JSON
/// are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Gamification fields the backend may attach to a todo mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Progress {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streak: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<String>,
}

impl Progress {
    pub fn is_empty(&self) -> bool {
        self.xp.is_none() && self.level.is_none() && self.streak.is_none() && self.rank.is_none()
    }
}

/// Response body of `PATCH /todos/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoPatch {
    pub todo: Todo,
    #[serde(flatten)]
    pub progress: Progress,
}

/// Credentials for login and signup. `Debug` never shows the password.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Response body of the login and signup endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// One row of `GET /leaderboard`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub id: String,
    pub username: String,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub xp: u64,
}
