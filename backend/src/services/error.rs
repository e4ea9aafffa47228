//! Domain error type returned by every portal service.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::db::repository::RepositoryError;
use crate::models::{CourseId, RoomId, Schedule, ScheduleError, StudentId};

pub type PortalResult<T> = Result<T, PortalError>;

/// Rejection reasons and infrastructure failures.
///
/// Everything except [`PortalError::StoreUnavailable`] is an expected domain
/// rejection that callers report back as a structured outcome.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("{entity} '{id}' already exists")]
    DuplicateEntity { entity: &'static str, id: String },

    #[error("Room {room} is not available at {schedule}")]
    RoomUnavailable { room: RoomId, schedule: Schedule },

    #[error("Instructor {instructor} is busy at {schedule}")]
    InstructorBusy {
        instructor: String,
        schedule: Schedule,
    },

    #[error("No instructor profile found with ID '{0}'")]
    InstructorNotFound(String),

    #[error("Student with ID '{0}' not found")]
    StudentNotFound(StudentId),

    #[error("Course with ID '{0}' not found")]
    CourseNotFound(CourseId),

    #[error("Student {student_id} is already enrolled in {course_id}")]
    AlreadyEnrolled {
        student_id: StudentId,
        course_id: CourseId,
    },

    #[error("Course {course_id} is full (capacity: {capacity})")]
    CourseFull { course_id: CourseId, capacity: u32 },

    #[error("Course {course_id} conflicts with enrolled course {conflicting}")]
    ScheduleConflict {
        course_id: CourseId,
        conflicting: CourseId,
    },

    #[error("Student {student_id} is not enrolled in {course_id}")]
    NotEnrolled {
        student_id: StudentId,
        course_id: CourseId,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] RepositoryError),
}

/// Machine-readable discriminant of a [`PortalError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingField,
    InvalidField,
    InvalidSchedule,
    DuplicateEntity,
    RoomUnavailable,
    InstructorBusy,
    InstructorNotFound,
    StudentNotFound,
    CourseNotFound,
    AlreadyEnrolled,
    CourseFull,
    ScheduleConflict,
    NotEnrolled,
    StoreUnavailable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MissingField => "MISSING_FIELD",
            ErrorKind::InvalidField => "INVALID_FIELD",
            ErrorKind::InvalidSchedule => "INVALID_SCHEDULE",
            ErrorKind::DuplicateEntity => "DUPLICATE_ENTITY",
            ErrorKind::RoomUnavailable => "ROOM_UNAVAILABLE",
            ErrorKind::InstructorBusy => "INSTRUCTOR_BUSY",
            ErrorKind::InstructorNotFound => "INSTRUCTOR_NOT_FOUND",
            ErrorKind::StudentNotFound => "STUDENT_NOT_FOUND",
            ErrorKind::CourseNotFound => "COURSE_NOT_FOUND",
            ErrorKind::AlreadyEnrolled => "ALREADY_ENROLLED",
            ErrorKind::CourseFull => "COURSE_FULL",
            ErrorKind::ScheduleConflict => "SCHEDULE_CONFLICT",
            ErrorKind::NotEnrolled => "NOT_ENROLLED",
            ErrorKind::StoreUnavailable => "STORE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PortalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortalError::MissingField(_) => ErrorKind::MissingField,
            PortalError::InvalidField { .. } => ErrorKind::InvalidField,
            PortalError::InvalidSchedule(_) => ErrorKind::InvalidSchedule,
            PortalError::DuplicateEntity { .. } => ErrorKind::DuplicateEntity,
            PortalError::RoomUnavailable { .. } => ErrorKind::RoomUnavailable,
            PortalError::InstructorBusy { .. } => ErrorKind::InstructorBusy,
            PortalError::InstructorNotFound(_) => ErrorKind::InstructorNotFound,
            PortalError::StudentNotFound(_) => ErrorKind::StudentNotFound,
            PortalError::CourseNotFound(_) => ErrorKind::CourseNotFound,
            PortalError::AlreadyEnrolled { .. } => ErrorKind::AlreadyEnrolled,
            PortalError::CourseFull { .. } => ErrorKind::CourseFull,
            PortalError::ScheduleConflict { .. } => ErrorKind::ScheduleConflict,
            PortalError::NotEnrolled { .. } => ErrorKind::NotEnrolled,
            PortalError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// True for domain rejections; false only for store failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, PortalError::StoreUnavailable(_))
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            PortalError::StoreUnavailable(e) => e.is_retryable(),
            _ => false,
        }
    }

    pub(crate) fn missing(field: &str) -> Self {
        PortalError::MissingField(field.to_string())
    }

    pub(crate) fn invalid(field: &str, reason: impl fmt::Display) -> Self {
        PortalError::InvalidField {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn duplicate(entity: &'static str, id: impl fmt::Display) -> Self {
        PortalError::DuplicateEntity {
            entity,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_code() {
        let err = PortalError::CourseFull {
            course_id: CourseId::from("C1"),
            capacity: 2,
        };
        assert_eq!(err.kind(), ErrorKind::CourseFull);
        assert_eq!(
            serde_json::to_string(&err.kind()).unwrap(),
            "\"COURSE_FULL\""
        );
        assert_eq!(err.to_string(), "Course C1 is full (capacity: 2)");
    }

    #[test]
    fn test_only_store_errors_are_retryable() {
        let store = PortalError::from(RepositoryError::connection("down"));
        assert!(store.is_retryable());
        assert!(!store.is_rejection());

        let rejected = PortalError::missing("course_id");
        assert!(!rejected.is_retryable());
        assert!(rejected.is_rejection());
        assert_eq!(rejected.to_string(), "Missing field: course_id");
    }

    #[test]
    fn test_schedule_errors_convert() {
        let err: PortalError = ScheduleError::NoDays.into();
        assert_eq!(err.kind(), ErrorKind::InvalidSchedule);
    }
}
