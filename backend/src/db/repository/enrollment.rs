//! Enrollment storage and the atomic admission commit.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::{CourseId, Enrollment, StudentId};

/// Result of [`EnrollmentRepository::commit_enrollment`].
///
/// Rejections are regular values, not errors: they are the store's verdict on
/// a request that lost a race against a concurrent writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentCommit {
    /// Enrollment stored; carries the course's count after the increment.
    Committed { registered_students_count: u32 },
    /// The (student, course) pair is already enrolled.
    AlreadyEnrolled,
    /// The course reached `capacity` before this request could take a seat.
    CapacityReached { capacity: u32 },
    /// The student already holds `conflicting`, which overlaps this course.
    ScheduleConflict { conflicting: CourseId },
    /// The course document disappeared between validation and commit.
    CourseMissing,
}

/// Repository trait for enrollment records.
#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Look up the enrollment for a (student, course) pair.
    async fn find_enrollment(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> RepositoryResult<Option<Enrollment>>;

    /// All enrollments held by a student, ordered by `course_id`.
    async fn enrollments_for_student(
        &self,
        student_id: &StudentId,
    ) -> RepositoryResult<Vec<Enrollment>>;

    /// Insert `enrollment` and increment the course's registered count as one
    /// atomic step.
    ///
    /// The implementation must re-check, inside the same critical section,
    /// that the pair is not already enrolled, that no other enrollment of the
    /// student overlaps the course in time and, when `capacity` is `Some`,
    /// that the current count is below it. Neither record changes unless both
    /// writes happen.
    ///
    /// # Arguments
    /// * `enrollment` - The record to insert
    /// * `capacity` - Seat limit for the course; `None` means unbounded
    async fn commit_enrollment(
        &self,
        enrollment: &Enrollment,
        capacity: Option<u32>,
    ) -> RepositoryResult<EnrollmentCommit>;
}
