//! Application Startup
//!
//! Service wiring and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::net::TcpListener;

use crate::application::services::{
    AuthService, AuthServiceImpl, ChatService, ChatServiceImpl, FriendshipService,
    FriendshipServiceImpl, GuestService, GuestServiceImpl, LobbyService, LobbyServiceImpl, Notifier,
    UserService, UserServiceImpl, UserStatusService, UserStatusServiceImpl,
};
use crate::config::Settings;
use crate::domain::{
    ChatMessageRepository, FriendshipRepository, GuestSessionStore, LobbyStore, ObjectStore,
    UserRepository,
};
use crate::infrastructure::health::{CacheProbe, DatabaseProbe, HealthProbe, ObjectStoreProbe};
use crate::infrastructure::repositories::{
    PgChatMessageRepository, PgFriendshipRepository, PgUserRepository,
};
use crate::infrastructure::storage::MinioStore;
use crate::infrastructure::{cache, database};
use crate::presentation::http::{create_router, handlers::health::init_server_start};
use crate::presentation::websocket::Gateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<dyn AuthService>,
    pub users: Arc<dyn UserService>,
    pub friendships: Arc<dyn FriendshipService>,
    pub chat: Arc<dyn ChatService>,
    pub status: Arc<dyn UserStatusService>,
    pub guests: Arc<dyn GuestService>,
    pub lobbies: Arc<dyn LobbyService>,
    pub gateway: Arc<Gateway>,
    pub probes: Arc<Vec<Arc<dyn HealthProbe>>>,
}

/// Storage the services are built on
pub struct Backends<U, F, M, G, L> {
    pub users: Arc<U>,
    pub friendships: Arc<F>,
    pub messages: Arc<M>,
    pub guests: Arc<G>,
    pub lobbies: Arc<L>,
    pub object_store: Arc<dyn ObjectStore>,
    pub probes: Vec<Arc<dyn HealthProbe>>,
}

impl AppState {
    /// Wire every service on top of the given backends.
    pub fn assemble<U, F, M, G, L>(settings: Settings, backends: Backends<U, F, M, G, L>) -> Self
    where
        U: UserRepository + 'static,
        F: FriendshipRepository + 'static,
        M: ChatMessageRepository + 'static,
        G: GuestSessionStore + 'static,
        L: LobbyStore + 'static,
    {
        let gateway = Arc::new(Gateway::new(settings.websocket.heartbeat_interval_ms));
        let notifier: Arc<dyn Notifier> = gateway.clone();

        let Backends {
            users,
            friendships,
            messages,
            guests,
            lobbies,
            object_store,
            probes,
        } = backends;

        let status: Arc<dyn UserStatusService> =
            Arc::new(UserStatusServiceImpl::new(friendships.clone(), notifier.clone()));

        Self {
            auth: Arc::new(AuthServiceImpl::new(users.clone(), settings.auth.clone())),
            users: Arc::new(UserServiceImpl::new(users.clone())),
            friendships: Arc::new(FriendshipServiceImpl::new(
                users.clone(),
                friendships.clone(),
                notifier.clone(),
            )),
            chat: Arc::new(ChatServiceImpl::new(
                users,
                friendships.clone(),
                messages,
                object_store,
                settings.uploads.clone(),
            )),
            lobbies: Arc::new(LobbyServiceImpl::new(lobbies, status.clone(), notifier)),
            status,
            guests: Arc::new(GuestServiceImpl::new(guests)),
            gateway,
            probes: Arc::new(probes),
            settings: Arc::new(settings),
        }
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        init_server_start();

        // Create database pool
        let db = database::create_pool(&settings.database)
            .await
            .context("Failed to connect to PostgreSQL")?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db)
                .await
                .context("Failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }

        // Create Redis client
        let redis = cache::create_redis_client(&settings.redis)
            .await
            .context("Failed to connect to Redis")?;

        // Object storage; the bucket is created when missing
        let object_store: Arc<dyn ObjectStore> = Arc::new(MinioStore::new(&settings.storage)?);
        object_store
            .ensure_bucket()
            .await
            .context("Failed to prepare the object storage bucket")?;
        tracing::info!(bucket = %object_store.bucket(), "Object storage ready");

        let probes: Vec<Arc<dyn HealthProbe>> = vec![
            Arc::new(DatabaseProbe::new(db.clone())),
            Arc::new(CacheProbe::new(redis.clone())),
            Arc::new(ObjectStoreProbe::new(object_store.clone())),
        ];

        let addr: SocketAddr = settings
            .server
            .socket_addr()
            .context("Invalid server address")?;

        let state = AppState::assemble(
            settings,
            Backends {
                users: Arc::new(PgUserRepository::new(db.clone())),
                friendships: Arc::new(PgFriendshipRepository::new(db.clone())),
                messages: Arc::new(PgChatMessageRepository::new(db)),
                guests: Arc::new(cache::RedisGuestStore::new(redis.clone())),
                lobbies: Arc::new(cache::RedisLobbyStore::new(redis)),
                object_store,
                probes,
            },
        );

        let router = create_router(state);

        // Bind to address
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
