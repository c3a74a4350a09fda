use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const XP_PER_QUEST: u64 = 10;
pub const XP_PER_LEVEL: u64 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub rank: String,
}

impl User {
    fn new(username: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username,
            xp: 0,
            level: 1,
            streak: 0,
            rank: rank_for(1).to_string(),
        }
    }

    /// Completing a quest earns xp and extends the streak; reopening it
    /// takes the xp back.
    fn record(&mut self, completed: bool) {
        if completed {
            self.xp += XP_PER_QUEST;
            self.streak += 1;
        } else {
            self.xp = self.xp.saturating_sub(XP_PER_QUEST);
        }
        self.level = level_for(self.xp);
        self.rank = rank_for(self.level).to_string();
    }
}

pub fn level_for(xp: u64) -> u32 {
    1 + (xp / XP_PER_LEVEL) as u32
}

pub fn rank_for(level: u32) -> &'static str {
    match level {
        0..=2 => "Novice",
        3..=4 => "Adventurer",
        5..=9 => "Hero",
        _ => "Legend",
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    pub completed: bool,
    pub time: String,
}

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    pub note: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub note: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TodoPatch {
    pub todo: Todo,
    pub xp: u64,
    pub level: u32,
    pub streak: u32,
    pub rank: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: String,
    pub username: String,
    pub level: u32,
    pub xp: u64,
}

struct Account {
    user: User,
    password: String,
}

/// All server state, keyed by user id.
#[derive(Default)]
pub struct Data {
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    todos: HashMap<String, Vec<Todo>>,
}

impl Data {
    fn user_id(&self, headers: &HeaderMap) -> Result<String, Failure> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .ok_or(Failure(StatusCode::UNAUTHORIZED, "Invalid or missing token"))
    }

    fn user(&self, id: &str) -> Result<&User, Failure> {
        self.accounts
            .get(id)
            .map(|a| &a.user)
            .ok_or(Failure(StatusCode::UNAUTHORIZED, "User no longer exists"))
    }

    fn issue_token(&mut self, user_id: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.tokens.insert(token.clone(), user_id.to_string());
        token
    }
}

pub type Db = Arc<RwLock<Data>>;

/// A non-2xx answer with an `{"error": ...}` body.
#[derive(Debug)]
pub struct Failure(StatusCode, &'static str);

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Data::default()));
    let api = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
        .route("/leaderboard", get(leaderboard))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn signup(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<(StatusCode, Json<AuthResponse>), Failure> {
    let username = input.username.trim().to_string();
    if username.is_empty() || input.password.is_empty() {
        return Err(Failure(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
        ));
    }
    let mut data = db.write().await;
    if data.accounts.values().any(|a| a.user.username == username) {
        return Err(Failure(StatusCode::BAD_REQUEST, "Username already taken"));
    }
    let user = User::new(username);
    data.accounts.insert(
        user.id.clone(),
        Account {
            user: user.clone(),
            password: input.password,
        },
    );
    let token = data.issue_token(&user.id);
    tracing::info!(username = %user.username, "signed up");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

async fn login(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<Json<AuthResponse>, Failure> {
    let mut data = db.write().await;
    let user = data
        .accounts
        .values()
        .find(|a| a.user.username == input.username.trim() && a.password == input.password)
        .map(|a| a.user.clone())
        .ok_or(Failure(StatusCode::UNAUTHORIZED, "Invalid credentials"))?;
    let token = data.issue_token(&user.id);
    tracing::info!(username = %user.username, "logged in");
    Ok(Json(AuthResponse { token, user }))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, Failure> {
    let data = db.read().await;
    let id = data.user_id(&headers)?;
    data.user(&id).cloned().map(Json)
}

async fn list_todos(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Todo>>, Failure> {
    let data = db.read().await;
    let id = data.user_id(&headers)?;
    Ok(Json(data.todos.get(&id).cloned().unwrap_or_default()))
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTodo>,
) -> Result<(StatusCode, Json<Todo>), Failure> {
    let mut data = db.write().await;
    let id = data.user_id(&headers)?;
    let title = input.title.trim().to_string();
    if title.is_empty() {
        return Err(Failure(StatusCode::BAD_REQUEST, "Title is required"));
    }
    let todo = Todo {
        id: Uuid::new_v4(),
        title,
        note: input.note,
        category: input.category,
        priority: input.priority,
        completed: false,
        time: chrono::Utc::now().to_rfc3339(),
    };
    data.todos.entry(id).or_default().insert(0, todo.clone());
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(todo_id): Path<Uuid>,
    Json(input): Json<UpdateTodo>,
) -> Result<Json<TodoPatch>, Failure> {
    let mut data = db.write().await;
    let user_id = data.user_id(&headers)?;
    let todo = data
        .todos
        .get_mut(&user_id)
        .and_then(|todos| todos.iter_mut().find(|t| t.id == todo_id))
        .ok_or(Failure(StatusCode::NOT_FOUND, "Todo not found"))?;

    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(note) = input.note {
        todo.note = Some(note);
    }
    if let Some(category) = input.category {
        todo.category = Some(category);
    }
    if let Some(priority) = input.priority {
        todo.priority = Some(priority);
    }
    let flipped = match input.completed {
        Some(completed) if completed != todo.completed => {
            todo.completed = completed;
            Some(completed)
        }
        _ => None,
    };
    let todo = todo.clone();

    let account = data
        .accounts
        .get_mut(&user_id)
        .ok_or(Failure(StatusCode::UNAUTHORIZED, "User no longer exists"))?;
    if let Some(completed) = flipped {
        account.user.record(completed);
    }
    let user = &account.user;
    Ok(Json(TodoPatch {
        todo,
        xp: user.xp,
        level: user.level,
        streak: user.streak,
        rank: user.rank.clone(),
    }))
}

async fn delete_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(todo_id): Path<Uuid>,
) -> Result<StatusCode, Failure> {
    let mut data = db.write().await;
    let user_id = data.user_id(&headers)?;
    let todos = data
        .todos
        .get_mut(&user_id)
        .ok_or(Failure(StatusCode::NOT_FOUND, "Todo not found"))?;
    let before = todos.len();
    todos.retain(|t| t.id != todo_id);
    if todos.len() == before {
        return Err(Failure(StatusCode::NOT_FOUND, "Todo not found"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn leaderboard(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Vec<LeaderboardEntry>>, Failure> {
    let data = db.read().await;
    data.user_id(&headers)?;
    let mut rows: Vec<LeaderboardEntry> = data
        .accounts
        .values()
        .map(|a| LeaderboardEntry {
            id: a.user.id.clone(),
            username: a.user.username.clone(),
            level: a.user.level,
            xp: a.user.xp,
        })
        .collect();
    rows.sort_by(|a, b| b.xp.cmp(&a.xp).then_with(|| a.username.cmp(&b.username)));
    Ok(Json(rows))
}
