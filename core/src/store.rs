//! The QuestLog store: session, todo collection and the operations that
//! mutate them.
//!
//! # Design
//! The server is the only source of truth for todo content. Every mutation
//! round-trips through the API and adopts the record the server returns;
//! nothing is computed optimistically. Operations take `&mut self`, so a
//! single store serializes its own calls; two stores (or two processes)
//! racing on the same todo simply see the last response win.
//!
//! Failures are logged and then turned into values the UI can show
//! directly: an error message for auth and add/update/delete, `None` for
//! toggle.

use tracing::{debug, error, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::{Session, SessionStatus};
use crate::token_store::TokenStore;
use crate::transport::Transport;
use crate::types::{
    Credentials, LeaderboardEntry, NewTodo, Todo, TodoChanges, TodoPatch, User,
};
use crate::views::{Stats, TodoList};

pub const TODO_CREATED: &str = "✅ Successfully Created A Todo";
pub const TODO_CREATE_FAILED: &str = "❌ Failed To Create A Todo";
pub const TODO_UPDATED: &str = "✅ Todo Updated Successfully";
pub const TODO_UPDATE_FAILED: &str = "❌ Failed To Update Todo";
pub const TODO_DELETED: &str = "✅ Todo Deleted Successfully";
pub const TODO_DELETE_FAILED: &str = "❌ Failed To Delete Todo";

#[derive(Debug, Clone, Copy)]
enum AuthKind {
    Login,
    Signup,
}

pub struct Store<T, S> {
    client: ApiClient,
    transport: T,
    tokens: S,
    session: Session,
    todos: TodoList,
}

impl<T: Transport, S: TokenStore> Store<T, S> {
    /// A store in the `Unknown` state; call `restore_session` once at startup.
    pub fn new(client: ApiClient, transport: T, tokens: S) -> Self {
        Self {
            client,
            transport,
            tokens,
            session: Session::new(),
            todos: TodoList::new(),
        }
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn todos(&self) -> &[Todo] {
        self.todos.all()
    }

    pub fn todo(&self, id: &str) -> Option<&Todo> {
        self.todos.get(id)
    }

    pub fn pending_todos(&self) -> Vec<&Todo> {
        self.todos.pending()
    }

    pub fn completed_todos(&self) -> Vec<&Todo> {
        self.todos.completed()
    }

    pub fn stats(&self) -> Stats {
        self.todos.stats()
    }

    /// True if `entry` is the signed-in user's leaderboard row.
    pub fn is_current_user(&self, entry: &LeaderboardEntry) -> bool {
        self.user().is_some_and(|u| u.id == entry.id)
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Startup check: revive a persisted session or settle as anonymous.
    ///
    /// A token the server rejects (401/403) or an unreadable token file is
    /// removed from storage. Network failures and 5xx answers leave the token
    /// in place so the next start can try again.
    pub async fn restore_session(&mut self) {
        self.session.begin_restore();

        let token = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read persisted token; discarding it");
                self.forget_token();
                None
            }
        };

        if let Some(token) = token {
            match self.fetch_me(&token).await {
                Ok(user) => {
                    self.session.authenticate(token, user);
                    if let Err(e) = self.load_todos().await {
                        warn!(error = %e, "could not load todos after restore");
                    }
                }
                Err(e) => {
                    warn!(error = %e, "session restore failed");
                    self.session.sign_out();
                    if e.is_unauthorized() {
                        self.forget_token();
                    }
                }
            }
        }

        self.session.finish_restore();
        debug!(status = ?self.session.status(), "session restore finished");
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), String> {
        self.authenticate(AuthKind::Login, username, password).await
    }

    pub async fn signup(&mut self, username: &str, password: &str) -> Result<(), String> {
        self.authenticate(AuthKind::Signup, username, password).await
    }

    /// Forget the token, the user and every todo.
    pub fn logout(&mut self) {
        self.forget_token();
        self.session.sign_out();
        self.todos.clear();
    }

    async fn authenticate(
        &mut self,
        kind: AuthKind,
        username: &str,
        password: &str,
    ) -> Result<(), String> {
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let auth = match self.request_auth(kind, &credentials).await {
            Ok(auth) => auth,
            Err(e) => {
                warn!(?kind, error = %e, "authentication failed");
                return Err(e.to_string());
            }
        };

        if let Err(e) = self.tokens.save(&auth.token) {
            warn!(error = %e, "could not persist token; session will not survive restart");
        }
        self.todos.clear();
        self.session.authenticate(auth.token, auth.user);
        self.session.finish_restore();

        if let Err(e) = self.load_todos().await {
            warn!(error = %e, "could not load todos after sign-in");
        }
        Ok(())
    }

    async fn request_auth(
        &self,
        kind: AuthKind,
        credentials: &Credentials,
    ) -> Result<crate::types::AuthResponse, ApiError> {
        let request = match kind {
            AuthKind::Login => self.client.build_login(credentials)?,
            AuthKind::Signup => self.client.build_signup(credentials)?,
        };
        let response = self.send(request).await?;
        self.client.parse_auth(response)
    }

    async fn fetch_me(&self, token: &str) -> Result<User, ApiError> {
        let response = self.send(self.client.build_me(token)).await?;
        self.client.parse_me(response)
    }

    fn forget_token(&mut self) {
        if let Err(e) = self.tokens.clear() {
            error!(error = %e, "could not clear persisted token");
        }
    }

    // ---------------------------------------------------------------------
    // Todos
    // ---------------------------------------------------------------------

    /// Replace the collection with the server's listing. On failure the
    /// current collection is left untouched.
    pub async fn load_todos(&mut self) -> Result<(), ApiError> {
        let token = self.require_token()?;
        let response = self.send(self.client.build_list_todos(&token)).await?;
        let todos = self.client.parse_list_todos(response)?;
        debug!(count = todos.len(), "todos loaded");
        self.todos.replace_all(todos);
        Ok(())
    }

    pub async fn add_todo(&mut self, input: NewTodo) -> String {
        match self.create_todo(&input).await {
            Ok(todo) => {
                self.todos.prepend(todo);
                TODO_CREATED.to_string()
            }
            Err(e) => {
                warn!(error = %e, "add todo failed");
                TODO_CREATE_FAILED.to_string()
            }
        }
    }

    /// Flip the completion flag of `id`. The user's xp/level/streak/rank are
    /// refreshed from the response when it carries them.
    pub async fn toggle_todo(&mut self, id: &str) -> Option<Todo> {
        let Some(current) = self.todos.get(id) else {
            warn!(id, "toggle on unknown todo");
            return None;
        };
        let changes = TodoChanges {
            completed: Some(!current.completed),
            ..TodoChanges::default()
        };
        match self.patch_todo(id, &changes).await {
            Ok(patch) => {
                self.todos.replace(patch.todo.clone());
                if !patch.progress.is_empty() {
                    self.session.apply_progress(&patch.progress);
                }
                Some(patch.todo)
            }
            Err(e) => {
                warn!(id, error = %e, "toggle todo failed");
                None
            }
        }
    }

    pub async fn update_todo(&mut self, id: &str, changes: TodoChanges) -> String {
        match self.patch_todo(id, &changes).await {
            Ok(patch) => {
                if !self.todos.replace(patch.todo) {
                    debug!(id, "updated todo is not in the local collection");
                }
                TODO_UPDATED.to_string()
            }
            Err(e) => {
                warn!(id, error = %e, "update todo failed");
                TODO_UPDATE_FAILED.to_string()
            }
        }
    }

    pub async fn delete_todo(&mut self, id: &str) -> String {
        match self.remove_todo(id).await {
            Ok(()) => {
                self.todos.remove(id);
                TODO_DELETED.to_string()
            }
            Err(e) => {
                warn!(id, error = %e, "delete todo failed");
                TODO_DELETE_FAILED.to_string()
            }
        }
    }

    pub async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let token = self.require_token()?;
        let response = self.send(self.client.build_leaderboard(&token)).await?;
        self.client.parse_leaderboard(response).inspect_err(|e| {
            warn!(error = %e, "leaderboard request failed");
        })
    }

    async fn create_todo(&self, input: &NewTodo) -> Result<Todo, ApiError> {
        input.validate()?;
        let token = self.require_token()?;
        let request = self.client.build_create_todo(&token, input)?;
        let response = self.send(request).await?;
        self.client.parse_create_todo(response)
    }

    async fn patch_todo(&self, id: &str, changes: &TodoChanges) -> Result<TodoPatch, ApiError> {
        let token = self.require_token()?;
        let request = self.client.build_update_todo(&token, id, changes)?;
        let response = self.send(request).await?;
        self.client.parse_update_todo(response)
    }

    async fn remove_todo(&self, id: &str) -> Result<(), ApiError> {
        let token = self.require_token()?;
        let response = self.send(self.client.build_delete_todo(&token, id)).await?;
        self.client.parse_delete_todo(response)
    }

    // ---------------------------------------------------------------------
    // Plumbing
    // ---------------------------------------------------------------------

    fn require_token(&self) -> Result<String, ApiError> {
        self.session
            .token()
            .map(str::to_string)
            .ok_or(ApiError::NotAuthenticated)
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let method = request.method;
        let path = request.path.clone();
        self.transport.execute(request).await.inspect_err(|e| {
            error!(method = method.as_str(), %path, error = %e, "request failed");
        })
    }
}
