//! Service layer for business logic and orchestration.
//!
//! Services are stateless async functions over any [`FullRepository`]
//! (including `dyn FullRepository`). Every decision is computed from the
//! store's current snapshot at call time.
//!
//! - [`availability`]: free rooms and instructors for a weekly slot
//! - [`course_creation`]: the course creation gate
//! - [`admission`]: the enrollment admission controller
//! - [`registration`]: profiles and login accounts
//! - [`performance`]: grade reports and registration menus
//!
//! [`FullRepository`]: crate::db::repository::FullRepository

pub mod admission;
pub mod availability;
pub mod course_creation;
pub mod error;
pub mod options;
pub mod performance;
pub mod registration;

pub use admission::{enroll, has_time_conflict, EnrollmentRef};
pub use availability::{available_instructors, available_rooms, conflicting_courses};
pub use course_creation::{
    create_course, CourseDetailsRequest, CourseRef, CourseRequest, NewCourse, ScheduleRequest,
};
pub use error::{ErrorKind, PortalError, PortalResult};
pub use options::{InstructorMatching, PortalOptions};
pub use performance::{
    available_courses_for_registration, list_courses, student_course_performance,
    student_performance, PerformanceCard, UNKNOWN_COURSE_NAME,
};
pub use registration::{
    create_account, create_instructor, create_student, register_instructor, register_student,
    AccountRequest, InstructorRequest, Registration, StudentRequest,
};

/// Check that the store answers.
pub async fn health_check<R: crate::db::repository::FullRepository + ?Sized>(
    repo: &R,
) -> PortalResult<bool> {
    Ok(repo.health_check().await?)
}
