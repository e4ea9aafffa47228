//! # University Portal Core
//!
//! Scheduling-conflict detection and enrollment admission control for a
//! university administration portal.
//!
//! Deans create courses, students register for them. This crate decides,
//! for a proposed weekly slot, which rooms and instructors are still free,
//! and admits enrollments only when the student and course exist, the pair
//! is new, a seat is left and the student has no overlapping course. The
//! seat and duplicate checks are re-applied atomically at commit time.
//!
//! ## Architecture
//!
//! - [`models`]: schedules, courses, catalog entities and enrollments
//! - [`db`]: repository traits, the in-memory and Postgres stores, config and factory
//! - [`services`]: availability, course creation, admission, registration, reports
//! - [`api`]: the [`api::ActionOutcome`] payload handed to downstream collaborators
//!
//! ## Example
//!
//! ```no_run
//! use university_portal::db::LocalRepository;
//! use university_portal::models::{Room, StudentId, CourseId};
//! use university_portal::services::{self, PortalOptions};
//!
//! # async fn run() -> Result<(), university_portal::services::PortalError> {
//! let repo = LocalRepository::new();
//! repo.seed_room(Room::new("R1", 2))?;
//! let _outcome = services::enroll(
//!     &repo,
//!     &StudentId::from("S1"),
//!     &CourseId::from("C1"),
//!     &PortalOptions::default(),
//! )
//! .await;
//! # Ok(())
//! # }
//! ```

// RepositoryError carries rich context; keep it inline in results
#![allow(clippy::result_large_err)]

pub mod api;
pub mod db;
pub mod models;
pub mod services;
