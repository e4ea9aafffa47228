//! Repository trait definitions for the portal store.
//!
//! Responsibilities are split across focused traits so fakes and adapters
//! stay small:
//!
//! - [`error`]: Error types for repository operations
//! - [`catalog`]: Rooms, instructors and students (read-mostly)
//! - [`course`]: Course documents and the weekday pre-filter
//! - [`enrollment`]: Enrollment records and the atomic admission commit
//! - [`registration`]: Profile and account creation
//!
//! # Convenience Trait Bound
//!
//! Services take any [`FullRepository`], including trait objects:
//!
//! ```ignore
//! async fn my_service<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let rooms = repo.list_rooms().await?;
//!     let courses = repo.list_courses().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod course;
pub mod enrollment;
pub mod error;
pub mod registration;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

pub use catalog::CatalogRepository;
pub use course::CourseRepository;
pub use enrollment::{EnrollmentCommit, EnrollmentRepository};
pub use registration::RegistrationRepository;

/// Composite trait bound for a complete repository implementation.
///
/// Automatically implemented for any type that implements all four
/// repository traits.
pub trait FullRepository:
    CatalogRepository + CourseRepository + EnrollmentRepository + RegistrationRepository
{
}

impl<T> FullRepository for T where
    T: CatalogRepository + CourseRepository + EnrollmentRepository + RegistrationRepository
{
}
