//! Storage layer for the portal.
//!
//! This module provides abstractions for database operations via the Repository pattern,
//! allowing different storage backends to be swapped easily.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Seeding CLI / embedding application                    │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Service Layer (crate::services) - Business Logic       │
//! │  - Availability resolution                              │
//! │  - Course creation and enrollment admission gates       │
//! │  - Registration and performance queries                 │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  Repository Traits (repository/) - Abstract Interface   │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │                              │
//! ┌───▼───────────────┐   ┌──────────▼─────────┐
//! │ LocalRepository   │   │ PostgresRepository │
//! │ (in-memory)       │   │ (Diesel, feature)  │
//! └───────────────────┘   └────────────────────┘
//! ```
//!
//! Repositories are created with [`RepositoryFactory`] or [`RepositoryBuilder`]
//! and passed explicitly to the service functions:
//!
//! ```ignore
//! use university_portal::db::RepositoryFactory;
//! use university_portal::services;
//!
//! let repo = RepositoryFactory::from_env().await?;
//! let rooms = services::available_rooms(repo.as_ref(), &schedule).await?;
//! ```

#[cfg(not(any(feature = "postgres-repo", feature = "local-repo")))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

// Postgres config is colocated with the repository implementation.
#[cfg(feature = "postgres-repo")]
pub use repositories::postgres::{PoolStats, PostgresConfig};
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    _private: (),
}
#[cfg(not(feature = "postgres-repo"))]
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    _private: (),
}

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::{AdmissionSettings, RepositoryConfig};
pub use repositories::LocalRepository;
#[cfg(feature = "postgres-repo")]
pub use repositories::PostgresRepository;
pub use repository::{
    CatalogRepository, CourseRepository, EnrollmentCommit, EnrollmentRepository, ErrorContext,
    FullRepository, RegistrationRepository, RepositoryError, RepositoryResult,
};
