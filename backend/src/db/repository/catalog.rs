//! Read-mostly catalog of rooms, instructors and students.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Instructor, InstructorId, Room, RoomId, Student, StudentId};

/// Repository trait for the room and people catalogs.
///
/// From the admission core's point of view rooms and instructors are
/// read-only; [`CatalogRepository::insert_room`] exists for seeding.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    // ==================== Health & Connection ====================

    /// Check if the store is reachable.
    ///
    /// # Returns
    /// - `Ok(true)` if the store is healthy
    /// - `Ok(false)` if it is unhealthy but no error occurred
    /// - `Err(RepositoryError)` if the check itself failed
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Rooms ====================

    /// Insert a room record.
    ///
    /// # Returns
    /// * `Err(RepositoryError::ConflictError)` - If a room with the same identifier exists
    async fn insert_room(&self, room: &Room) -> RepositoryResult<()>;

    /// Look up a room by identifier.
    async fn find_room(&self, room: &RoomId) -> RepositoryResult<Option<Room>>;

    /// All rooms, ordered by identifier.
    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>>;

    // ==================== People ====================

    /// Look up an instructor profile by its public identifier.
    async fn find_instructor(
        &self,
        instructor_id: &InstructorId,
    ) -> RepositoryResult<Option<Instructor>>;

    /// All instructor profiles, ordered by identifier.
    async fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>>;

    /// Look up a student profile by its public identifier.
    async fn find_student(&self, student_id: &StudentId) -> RepositoryResult<Option<Student>>;
}
