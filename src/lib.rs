//! # L2P-Online Backend Library
//!
//! Social backend of the L2P-Online game portal:
//! - Accounts with JWT authentication (Bearer header or cookie)
//! - Friend requests, friend lists and user search
//! - One-to-one chat with image attachments in S3-compatible storage
//! - WebSocket gateway for messages, typing and presence
//! - Short-lived guest sessions in Redis
//! - Pre-game lobbies in Redis, shown to friends as presence
//!
//! ## Architecture
//!
//! - **Domain Layer**: Core business entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: PostgreSQL, Redis, MinIO and metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! l2p_backend/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, cache, storage implementations
//! +-- presentation/   HTTP routes and WebSocket handlers
//! +-- shared/         Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
