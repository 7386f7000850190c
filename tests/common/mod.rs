//! Common Test Utilities
//!
//! In-memory backends and an `axum-test` server around the real router.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use fake::faker::internet::en::Username;
use fake::Fake;
use parking_lot::Mutex;
use serde_json::{json, Value};
use uuid::Uuid;

use l2p_backend::application::services::ChatService;
use l2p_backend::config::Settings;
use l2p_backend::domain::{
    ChatMessage, ChatMessageRepository, FriendEntry, Friendship, FriendshipRepository,
    FriendshipStatus, GuestSessionStore, LobbyStore, NewChatMessage, NewUser, ObjectStore, RegisteredUser,
    UserChanges, UserRepository,
};
use l2p_backend::infrastructure::health::HealthProbe;
use l2p_backend::presentation::http::create_router;
use l2p_backend::shared::error::AppError;
use l2p_backend::startup::{AppState, Backends};

pub const TEST_SECRET: &str = "integration-test-secret-key-0123456789";
pub const TEST_BUCKET: &str = "l2p-bucket";

/// Built-in defaults with a valid signing secret.
pub fn test_settings() -> Settings {
    Settings::defaults(config::Config::builder(), "test")
        .and_then(|b| b.set_override("auth.secret_key", TEST_SECRET))
        .and_then(|b| b.build())
        .and_then(|c| c.try_deserialize())
        .expect("test settings should load")
}

#[derive(Default)]
struct Tables {
    users: Vec<RegisteredUser>,
    friendships: Vec<Friendship>,
    messages: Vec<ChatMessage>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Users, friendships and messages behind one lock.
#[derive(Default)]
pub struct InMemoryDb {
    tables: Mutex<Tables>,
}

impl InMemoryDb {
    /// Flip `is_active` directly, as an admin would.
    pub fn set_active(&self, user_id: i64, active: bool) {
        if let Some(user) = self.tables.lock().users.iter_mut().find(|u| u.id == user_id) {
            user.is_active = active;
        }
    }

    pub fn message_count(&self) -> usize {
        self.tables.lock().messages.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryDb {
    async fn find_by_id(&self, id: i64) -> Result<Option<RegisteredUser>, AppError> {
        Ok(self.tables.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<RegisteredUser>, AppError> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<RegisteredUser, AppError> {
        let mut tables = self.tables.lock();
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email) || u.nickname == user.nickname)
        {
            return Err(AppError::Conflict("User already exists".into()));
        }
        let created = RegisteredUser {
            id: tables.next_id(),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            password_hash: Some(user.password_hash.clone()),
            is_active: true,
            pfp_path: None,
            description: None,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, changes: &UserChanges) -> Result<RegisteredUser, AppError> {
        let mut tables = self.tables.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        if let Some(v) = &changes.nickname {
            user.nickname = v.clone();
        }
        if let Some(v) = &changes.email {
            user.email = v.clone();
        }
        if let Some(v) = &changes.password_hash {
            user.password_hash = Some(v.clone());
        }
        if let Some(v) = &changes.pfp_path {
            user.pfp_path = Some(v.clone());
        }
        if let Some(v) = &changes.description {
            user.description = Some(v.clone());
        }
        Ok(user.clone())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.find_by_email(email).await?.is_some())
    }

    async fn nickname_exists(&self, nickname: &str) -> Result<bool, AppError> {
        Ok(self.tables.lock().users.iter().any(|u| u.nickname == nickname))
    }

    async fn search_active(
        &self,
        query: &str,
        exclude_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<RegisteredUser>, i64), AppError> {
        let needle = query.to_lowercase();
        let mut matches: Vec<RegisteredUser> = self
            .tables
            .lock()
            .users
            .iter()
            .filter(|u| u.is_active && u.id != exclude_id)
            .filter(|u| u.nickname.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.nickname.cmp(&b.nickname));
        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();
        Ok((page, total))
    }
}

#[async_trait]
impl FriendshipRepository for InMemoryDb {
    async fn find_by_id(&self, id: i64) -> Result<Option<Friendship>, AppError> {
        Ok(self.tables.lock().friendships.iter().find(|f| f.id == id).cloned())
    }

    async fn find_between(&self, user_a: i64, user_b: i64) -> Result<Option<Friendship>, AppError> {
        Ok(self
            .tables
            .lock()
            .friendships
            .iter()
            .find(|f| f.involves(user_a) && f.involves(user_b))
            .cloned())
    }

    async fn find_directed(
        &self,
        requester: i64,
        recipient: i64,
    ) -> Result<Option<Friendship>, AppError> {
        Ok(self
            .tables
            .lock()
            .friendships
            .iter()
            .find(|f| f.user_id_1 == requester && f.user_id_2 == recipient)
            .cloned())
    }

    async fn create_pending(&self, requester: i64, recipient: i64) -> Result<Friendship, AppError> {
        let mut tables = self.tables.lock();
        let friendship = Friendship {
            id: tables.next_id(),
            user_id_1: requester,
            user_id_2: recipient,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        };
        tables.friendships.push(friendship.clone());
        Ok(friendship)
    }

    async fn update_status(
        &self,
        id: i64,
        status: FriendshipStatus,
    ) -> Result<Friendship, AppError> {
        let mut tables = self.tables.lock();
        let friendship = tables
            .friendships
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound("Friendship not found".into()))?;
        friendship.status = status;
        Ok(friendship.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.lock();
        tables.friendships.retain(|f| f.id != id);
        tables.messages.retain(|m| m.friendship_id != id);
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: i64,
        status: Option<FriendshipStatus>,
    ) -> Result<Vec<FriendEntry>, AppError> {
        let tables = self.tables.lock();
        Ok(tables
            .friendships
            .iter()
            .filter(|f| f.involves(user_id))
            .filter(|f| status.map_or(true, |s| f.status == s))
            .filter_map(|f| {
                let friend_id = f.other_member(user_id);
                tables
                    .users
                    .iter()
                    .find(|u| u.id == friend_id)
                    .map(|friend| FriendEntry {
                        friendship: f.clone(),
                        friend: friend.clone(),
                    })
            })
            .collect())
    }

    async fn accepted_friend_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .tables
            .lock()
            .friendships
            .iter()
            .filter(|f| f.is_accepted() && f.involves(user_id))
            .map(|f| f.other_member(user_id))
            .collect())
    }
}

#[async_trait]
impl ChatMessageRepository for InMemoryDb {
    async fn create(&self, message: &NewChatMessage) -> Result<ChatMessage, AppError> {
        let mut tables = self.tables.lock();
        let stored = ChatMessage {
            id: tables.next_id(),
            friendship_id: message.friendship_id,
            sender_id: message.sender_id,
            content: message.content.clone(),
            image_path: message.image_path.clone(),
            created_at: Utc::now(),
        };
        tables.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_before(
        &self,
        friendship_id: i64,
        before: Option<i64>,
        limit: i64,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let mut page: Vec<ChatMessage> = self
            .tables
            .lock()
            .messages
            .iter()
            .filter(|m| m.friendship_id == friendship_id)
            .filter(|m| before.map_or(true, |b| m.id < b))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.id.cmp(&a.id));
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn count(&self, friendship_id: i64) -> Result<i64, AppError> {
        Ok(self
            .tables
            .lock()
            .messages
            .iter()
            .filter(|m| m.friendship_id == friendship_id)
            .count() as i64)
    }

    async fn latest_per_friendship(
        &self,
        friendship_ids: &[i64],
    ) -> Result<Vec<ChatMessage>, AppError> {
        let tables = self.tables.lock();
        Ok(friendship_ids
            .iter()
            .filter_map(|fid| {
                tables
                    .messages
                    .iter()
                    .filter(|m| m.friendship_id == *fid)
                    .max_by_key(|m| m.id)
                    .cloned()
            })
            .collect())
    }
}

/// Guest sessions without expiry.
#[derive(Default)]
pub struct InMemoryGuestStore {
    sessions: Mutex<HashMap<Uuid, String>>,
    nicknames: Mutex<HashSet<String>>,
}

impl InMemoryGuestStore {
    pub fn corrupt(&self, guest_id: Uuid) {
        self.sessions.lock().insert(guest_id, "{oops".into());
    }

    pub fn nickname_count(&self) -> usize {
        self.nicknames.lock().len()
    }
}

#[async_trait]
impl GuestSessionStore for InMemoryGuestStore {
    async fn is_nickname_taken(&self, nickname: &str) -> Result<bool, AppError> {
        Ok(self.nicknames.lock().contains(nickname))
    }

    async fn save(
        &self,
        guest_id: Uuid,
        nickname: &str,
        payload: &str,
        _ttl_seconds: u64,
    ) -> Result<(), AppError> {
        self.sessions.lock().insert(guest_id, payload.to_string());
        self.nicknames.lock().insert(nickname.to_string());
        Ok(())
    }

    async fn load(&self, guest_id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self.sessions.lock().get(&guest_id).cloned())
    }

    async fn touch(&self, guest_id: Uuid, _ttl_seconds: u64) -> Result<bool, AppError> {
        Ok(self.sessions.lock().contains_key(&guest_id))
    }

    async fn remove(&self, guest_id: Uuid, nickname: Option<String>) -> Result<bool, AppError> {
        if let Some(nickname) = nickname {
            self.nicknames.lock().remove(&nickname);
        }
        Ok(self.sessions.lock().remove(&guest_id).is_some())
    }
}

/// Lobbies and user pointers without expiry.
#[derive(Default)]
pub struct InMemoryLobbyStore {
    lobbies: Mutex<HashMap<String, String>>,
    pointers: Mutex<HashMap<i64, String>>,
}

impl InMemoryLobbyStore {
    pub fn lobby_count(&self) -> usize {
        self.lobbies.lock().len()
    }

    pub fn pointer(&self, user_id: i64) -> Option<String> {
        self.pointers.lock().get(&user_id).cloned()
    }
}

#[async_trait]
impl LobbyStore for InMemoryLobbyStore {
    async fn exists(&self, lobby_code: &str) -> Result<bool, AppError> {
        Ok(self.lobbies.lock().contains_key(lobby_code))
    }

    async fn load(&self, lobby_code: &str) -> Result<Option<String>, AppError> {
        Ok(self.lobbies.lock().get(lobby_code).cloned())
    }

    async fn save(
        &self,
        lobby_code: &str,
        payload: &str,
        member_ids: &[i64],
        released: Option<i64>,
        _ttl_seconds: u64,
    ) -> Result<(), AppError> {
        self.lobbies
            .lock()
            .insert(lobby_code.to_string(), payload.to_string());
        let mut pointers = self.pointers.lock();
        for user_id in member_ids {
            pointers.insert(*user_id, lobby_code.to_string());
        }
        if let Some(user_id) = released {
            pointers.remove(&user_id);
        }
        Ok(())
    }

    async fn user_lobby(&self, user_id: i64) -> Result<Option<String>, AppError> {
        Ok(self.pointer(user_id))
    }

    async fn delete(&self, lobby_code: &str, member_ids: &[i64]) -> Result<(), AppError> {
        self.lobbies.lock().remove(lobby_code);
        let mut pointers = self.pointers.lock();
        for user_id in member_ids {
            pointers.remove(user_id);
        }
        Ok(())
    }
}

/// Object store that signs nothing and remembers "uploaded" objects.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<String, u64>>,
}

impl InMemoryObjectStore {
    /// Simulate a small client upload.
    pub fn put(&self, object_name: &str) {
        self.put_sized(object_name, 1024);
    }

    pub fn put_sized(&self, object_name: &str, size: u64) {
        self.objects.lock().insert(object_name.to_string(), size);
    }

    pub fn contains(&self, object_name: &str) -> bool {
        self.objects.lock().contains_key(object_name)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    fn bucket(&self) -> String {
        TEST_BUCKET.to_string()
    }

    async fn ensure_bucket(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn presigned_put_url(&self, object_name: &str, ttl: Duration) -> Result<String, AppError> {
        Ok(format!(
            "http://storage.test/{}/{}?op=put&ttl={}",
            TEST_BUCKET,
            object_name,
            ttl.as_secs()
        ))
    }

    fn presigned_get_url(&self, object_name: &str, ttl: Duration) -> Result<String, AppError> {
        Ok(format!(
            "http://storage.test/{}/{}?op=get&ttl={}",
            TEST_BUCKET,
            object_name,
            ttl.as_secs()
        ))
    }

    async fn object_size(&self, object_name: &str) -> Result<Option<u64>, AppError> {
        Ok(self.objects.lock().get(object_name).copied())
    }

    async fn delete_object(&self, object_name: &str) -> Result<(), AppError> {
        self.objects.lock().remove(object_name);
        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Probe with a fixed outcome.
pub struct StaticProbe {
    pub name: &'static str,
    pub critical: bool,
    pub healthy: bool,
}

#[async_trait]
impl HealthProbe for StaticProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_critical(&self) -> bool {
        self.critical
    }

    fn degraded_after(&self) -> Duration {
        Duration::from_secs(5)
    }

    async fn check(&self) -> Result<(), String> {
        if self.healthy {
            Ok(())
        } else {
            Err(format!("{} unreachable", self.name))
        }
    }
}

/// Test application builder
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub db: Arc<InMemoryDb>,
    pub guests: Arc<InMemoryGuestStore>,
    pub lobbies: Arc<InMemoryLobbyStore>,
    pub storage: Arc<InMemoryObjectStore>,
}

/// A registered account and its bearer token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let probes: Vec<Arc<dyn HealthProbe>> = vec![
            Arc::new(StaticProbe { name: "database", critical: true, healthy: true }),
            Arc::new(StaticProbe { name: "cache", critical: false, healthy: true }),
        ];
        Self::with_probes(probes)
    }

    pub fn with_probes(probes: Vec<Arc<dyn HealthProbe>>) -> Self {
        Self::build(probes, false)
    }

    /// Served over a real socket, which WebSocket upgrades need.
    pub fn with_http_transport() -> Self {
        let probes: Vec<Arc<dyn HealthProbe>> = vec![Arc::new(StaticProbe {
            name: "database",
            critical: true,
            healthy: true,
        })];
        Self::build(probes, true)
    }

    fn build(probes: Vec<Arc<dyn HealthProbe>>, http_transport: bool) -> Self {
        let db = Arc::new(InMemoryDb::default());
        let guests = Arc::new(InMemoryGuestStore::default());
        let lobbies = Arc::new(InMemoryLobbyStore::default());
        let storage = Arc::new(InMemoryObjectStore::default());

        let state = AppState::assemble(
            test_settings(),
            Backends {
                users: db.clone(),
                friendships: db.clone(),
                messages: db.clone(),
                guests: guests.clone(),
                lobbies: lobbies.clone(),
                object_store: storage.clone(),
                probes,
            },
        );

        let router = create_router(state.clone());
        let server = if http_transport {
            TestServer::builder().http_transport().build(router)
        } else {
            TestServer::new(router)
        }
        .expect("test server");

        Self {
            server,
            state,
            db,
            guests,
            lobbies,
            storage,
        }
    }

    /// Register and log in a fresh account.
    pub async fn create_user(&self) -> TestUser {
        let nickname = unique_nickname();
        let email = format!("{}@example.com", nickname);
        let password = "secret-pass".to_string();

        let registered: Value = self
            .server
            .post("/auth/register")
            .json(&json!({ "email": email, "password": password, "nickname": nickname }))
            .await
            .json();

        let login: Value = self
            .server
            .post("/auth/login")
            .json(&json!({ "email": email, "password": password }))
            .await
            .json();

        TestUser {
            id: registered["id"].as_i64().expect("id"),
            nickname,
            email,
            password,
            token: login["access_token"].as_str().expect("token").to_string(),
        }
    }

    /// Two users with an accepted friendship.
    pub async fn create_friends(&self) -> (TestUser, TestUser) {
        let a = self.create_user().await;
        let b = self.create_user().await;

        self.server
            .post("/friends/request")
            .authorization_bearer(&a.token)
            .json(&json!({ "friend_user_id": b.id }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        self.server
            .post("/friends/accept")
            .authorization_bearer(&b.token)
            .json(&json!({ "friend_user_id": a.id }))
            .await
            .assert_status_ok();

        (a, b)
    }

    /// Store a message the way the gateway does.
    pub async fn send_message(&self, from: &TestUser, to: &TestUser, content: &str) -> i64 {
        self.state
            .chat
            .process_send_message(from.id, to.id, Some(content.to_string()), None)
            .await
            .expect("message stored")
            .message
            .id
    }
}

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique nickname of at least 3 characters
pub fn unique_nickname() -> String {
    let base: String = Username().fake();
    let base: String = base.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("u{}_{}", base, COUNTER.fetch_add(1, Ordering::Relaxed))
}
