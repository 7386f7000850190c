//! Application settings and configuration structures.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Server configuration (host, port)
    pub server: ServerSettings,

    /// Database configuration (PostgreSQL)
    pub database: DatabaseSettings,

    /// Redis configuration
    pub redis: RedisSettings,

    /// Object store configuration (MinIO / S3)
    pub storage: ObjectStoreSettings,

    /// JWT authentication settings
    pub auth: AuthSettings,

    /// Chat image upload rules
    pub uploads: UploadSettings,

    /// CORS configuration
    pub cors: CorsSettings,

    /// Realtime gateway configuration
    pub websocket: WebSocketSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Server binding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,

    /// Port number to listen on
    pub port: u16,
}

/// PostgreSQL database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections to maintain
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub acquire_timeout: u64,

    /// Apply pending migrations on startup
    pub run_migrations: bool,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,

    /// Logical database index
    pub db: i64,

    /// Empty string means no AUTH
    #[serde(default)]
    pub password: String,
}

/// S3-compatible object store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreSettings {
    /// `host:port` of the MinIO server, without scheme
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,

    /// Use HTTPS when talking to the endpoint
    pub secure: bool,

    /// Signing region; MinIO accepts the S3 default
    pub region: String,
}

/// JWT authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Secret key for signing tokens
    pub secret_key: String,

    /// Token and cookie lifetime in seconds
    pub jwt_lifetime_seconds: i64,

    /// Name of the session cookie
    pub cookie_name: String,

    /// Mark the cookie `Secure`
    pub cookie_secure: bool,
}

/// Chat image upload configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadSettings {
    /// Maximum accepted image size in bytes
    pub max_image_size: u64,

    /// MIME types accepted for chat images
    pub allowed_image_types: Vec<String>,

    /// Lifetime of presigned download URLs
    pub image_url_expiry_hours: u64,

    /// Lifetime of presigned upload URLs
    pub upload_url_expiry_minutes: u64,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    /// Allowed origins (comma-separated in env); empty allows any origin
    pub allowed_origins: Vec<String>,
}

/// Realtime gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketSettings {
    /// Maximum message size in bytes (default: 64KB)
    pub max_message_size: usize,

    /// Maximum frame size in bytes (default: 16KB)
    pub max_frame_size: usize,

    /// Heartbeat interval in milliseconds (default: 25000)
    pub heartbeat_interval_ms: u64,
}

/// Minimum required length for the signing secret (256 bits = 32 bytes)
pub const MIN_SECRET_KEY_LENGTH: usize = 32;

/// Flat environment variables and the settings keys they override.
const FLAT_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("POSTGRES_HOST", "database.host"),
    ("POSTGRES_PORT", "database.port"),
    ("POSTGRES_USER", "database.user"),
    ("POSTGRES_PASSWORD", "database.password"),
    ("POSTGRES_DB", "database.name"),
    ("RUN_MIGRATIONS", "database.run_migrations"),
    ("REDIS_HOST", "redis.host"),
    ("REDIS_PORT", "redis.port"),
    ("REDIS_DB", "redis.db"),
    ("REDIS_PASSWORD", "redis.password"),
    ("MINIO_ENDPOINT", "storage.endpoint"),
    ("MINIO_ACCESS_KEY", "storage.access_key"),
    ("MINIO_SECRET_KEY", "storage.secret_key"),
    ("MINIO_BUCKET_NAME", "storage.bucket_name"),
    ("MINIO_SECURE", "storage.secure"),
    ("SECRET_KEY", "auth.secret_key"),
    ("JWT_LIFETIME_SECONDS", "auth.jwt_lifetime_seconds"),
    ("MAX_IMAGE_SIZE", "uploads.max_image_size"),
    ("IMAGE_URL_EXPIRY_HOURS", "uploads.image_url_expiry_hours"),
];

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. Built-in defaults
    /// 2. config/default.toml (base configuration)
    /// 3. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 4. `APP__SECTION__KEY` environment variables
    /// 5. Flat variables such as `POSTGRES_HOST` or `MINIO_BUCKET_NAME` (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if the signing secret is too short.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults(Config::builder(), &environment)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__SERVER__PORT=8000 -> server.port = 8000
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        for (var, key) in FLAT_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        if let Ok(origins) = std::env::var("CORS_ALLOWED_ORIGINS") {
            let origins: Vec<String> = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
            builder = builder.set_override("cors.allowed_origins", origins)?;
        }

        builder
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| settings.validate())
    }

    /// Register the built-in defaults on a builder.
    pub fn defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
        environment: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("environment", environment)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("database.host", "localhost")?
            .set_default("database.port", 5432)?
            .set_default("database.user", "postgres")?
            .set_default("database.password", "postgres")?
            .set_default("database.name", "l2p_db")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout", 30)?
            .set_default("database.run_migrations", true)?
            .set_default("redis.host", "localhost")?
            .set_default("redis.port", 6379)?
            .set_default("redis.db", 0)?
            .set_default("redis.password", "")?
            .set_default("storage.endpoint", "localhost:9000")?
            .set_default("storage.access_key", "minioadmin")?
            .set_default("storage.secret_key", "minioadmin")?
            .set_default("storage.bucket_name", "l2p-bucket")?
            .set_default("storage.secure", false)?
            .set_default("storage.region", "us-east-1")?
            .set_default("auth.jwt_lifetime_seconds", 3600)?
            .set_default("auth.cookie_name", "l2p_auth")?
            .set_default("auth.cookie_secure", false)?
            .set_default("uploads.max_image_size", 10_i64 * 1024 * 1024)?
            .set_default(
                "uploads.allowed_image_types",
                vec!["image/jpeg", "image/png", "image/gif", "image/webp"],
            )?
            .set_default("uploads.image_url_expiry_hours", 24)?
            .set_default("uploads.upload_url_expiry_minutes", 15)?
            .set_default("cors.allowed_origins", Vec::<String>::new())?
            .set_default("websocket.max_message_size", 65536_i64)? // 64KB
            .set_default("websocket.max_frame_size", 16384_i64)? // 16KB
            .set_default("websocket.heartbeat_interval_ms", 25000_i64)
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.auth.secret_key.len() < MIN_SECRET_KEY_LENGTH {
            return Err(ConfigError::Message(format!(
                "SECRET_KEY must be at least {} characters. Current length: {}",
                MIN_SECRET_KEY_LENGTH,
                self.auth.secret_key.len()
            )));
        }
        Ok(self)
    }

    /// Get the full server address as a string.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl ServerSettings {
    /// Get the socket address for binding.
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl DatabaseSettings {
    /// Build the PostgreSQL connection URL.
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.name
        )
    }
}

impl RedisSettings {
    /// Build the Redis connection URL.
    pub fn connection_url(&self) -> String {
        if self.password.is_empty() {
            format!("redis://{}:{}/{}", self.host, self.port, self.db)
        } else {
            format!(
                "redis://:{}@{}:{}/{}",
                self.password, self.host, self.port, self.db
            )
        }
    }
}

impl ObjectStoreSettings {
    /// Scheme and authority of the object store endpoint.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}
