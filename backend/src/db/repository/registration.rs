//! Profile and account registration.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{Account, Instructor, Student, UserId};

/// Repository trait for creating people and their login accounts.
///
/// The `register_*` methods write a profile and its account atomically: if
/// either insert is rejected, neither record is stored.
#[async_trait]
pub trait RegistrationRepository: Send + Sync {
    /// Insert a student profile. Duplicate `student_id` → `ConflictError`.
    async fn insert_student(&self, student: &Student) -> RepositoryResult<()>;

    /// Insert an instructor profile. Duplicate `instructor_id` → `ConflictError`.
    async fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<()>;

    /// Look up a login account.
    async fn find_account(&self, user_id: &UserId) -> RepositoryResult<Option<Account>>;

    /// Insert a login account. Duplicate `user_id` → `ConflictError`.
    async fn insert_account(&self, account: &Account) -> RepositoryResult<()>;

    /// Insert a student profile and its account in one atomic write.
    async fn register_student(&self, student: &Student, account: &Account)
        -> RepositoryResult<()>;

    /// Insert an instructor profile and its account in one atomic write.
    async fn register_instructor(
        &self,
        instructor: &Instructor,
        account: &Account,
    ) -> RepositoryResult<()>;
}
