//! Course document storage.

use async_trait::async_trait;
use std::collections::BTreeSet;

use super::error::RepositoryResult;
use crate::models::{Course, CourseId, Weekday};

/// Repository trait for course documents.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist a new course.
    ///
    /// The store enforces `course_id` uniqueness; a concurrent duplicate insert
    /// fails with `RepositoryError::ConflictError` instead of creating a second
    /// document.
    async fn insert_course(&self, course: &Course) -> RepositoryResult<()>;

    /// Look up a course by its public identifier.
    async fn find_course(&self, course_id: &CourseId) -> RepositoryResult<Option<Course>>;

    /// All courses, ordered by `course_id`.
    async fn list_courses(&self) -> RepositoryResult<Vec<Course>>;

    /// Courses whose identifiers are in `course_ids`, ordered by `course_id`.
    /// Unknown identifiers are skipped.
    async fn courses_by_ids(&self, course_ids: &[CourseId]) -> RepositoryResult<Vec<Course>>;

    /// Courses meeting on at least one of `days`.
    ///
    /// This is a pre-filter: callers still check the time interval.
    async fn courses_meeting_on(&self, days: &BTreeSet<Weekday>) -> RepositoryResult<Vec<Course>>;
}
