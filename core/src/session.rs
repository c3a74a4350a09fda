//! Authenticated-session state.
//!
//! ```text
//! Unknown (loading) --restore ok--> Authenticated
//! Unknown (loading) --no/invalid token--> Anonymous
//! Anonymous --login/signup--> Authenticated
//! Authenticated --logout / rejected token--> Anonymous
//! ```

use tracing::debug;

use crate::types::{Progress, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Startup restore has not finished; auth-dependent UI must wait.
    Unknown,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    token: Option<String>,
    loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh session awaiting restore.
    pub fn new() -> Self {
        Self {
            user: None,
            token: None,
            loading: true,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.loading {
            SessionStatus::Unknown
        } else if self.user.is_some() && self.token.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Anonymous
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn begin_restore(&mut self) {
        self.loading = true;
    }

    pub fn finish_restore(&mut self) {
        self.loading = false;
    }

    pub fn authenticate(&mut self, token: String, user: User) {
        debug!(user = %user.username, "session authenticated");
        self.token = Some(token);
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        debug!("session cleared");
        self.token = None;
        self.user = None;
    }

    /// Copy gamification fields from a mutation response onto the user.
    /// Returns true if anything changed.
    pub fn apply_progress(&mut self, progress: &Progress) -> bool {
        let Some(user) = self.user.as_mut() else {
            return false;
        };
        let before = user.clone();
        if let Some(xp) = progress.xp {
            user.xp = xp;
        }
        if let Some(level) = progress.level {
            user.level = level;
        }
        if let Some(streak) = progress.streak {
            user.streak = streak;
        }
        if let Some(rank) = &progress.rank {
            user.rank = rank.clone();
        }
        *user != before
    }
}
