//! Enrollment admission controller.
//!
//! Gates run in a fixed order against the current snapshot:
//!
//! 1. the student exists
//! 2. the course exists
//! 3. the pair is not already enrolled
//! 4. the course has a free seat
//! 5. no current enrollment of the student conflicts in time
//!
//! The write itself is a single [`EnrollmentRepository::commit_enrollment`]
//! call that re-checks the pair, the time conflict and the seat count
//! atomically, so two racing requests can never both take the last seat or
//! both place one student in overlapping courses.
//!
//! [`EnrollmentRepository::commit_enrollment`]: crate::db::repository::EnrollmentRepository::commit_enrollment

use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::error::{PortalError, PortalResult};
use super::options::PortalOptions;
use crate::db::repository::{EnrollmentCommit, FullRepository};
use crate::models::{Course, CourseId, Enrollment, EnrollmentKey, StudentId};

/// Result of a committed enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRef {
    pub e_id: EnrollmentKey,
    pub student_id: StudentId,
    pub course_id: CourseId,
    /// Course count right after this enrollment.
    pub registered_students_count: u32,
}

/// First course (by id) the student is enrolled in that conflicts with `course`.
///
/// An enrollment in `course` itself is ignored.
pub async fn has_time_conflict<R: FullRepository + ?Sized>(
    repo: &R,
    student_id: &StudentId,
    course: &Course,
) -> PortalResult<Option<CourseId>> {
    let enrolled: Vec<CourseId> = repo
        .enrollments_for_student(student_id)
        .await?
        .into_iter()
        .map(|e| e.course_id)
        .filter(|id| id != &course.course_id)
        .collect();
    if enrolled.is_empty() {
        return Ok(None);
    }

    let courses = repo.courses_by_ids(&enrolled).await?;
    Ok(courses
        .into_iter()
        .find(|c| c.schedule().conflicts_with(course.schedule()))
        .map(|c| c.course_id))
}

/// Seat limit for `course`, or `None` when its room is not in the catalog.
async fn course_capacity<R: FullRepository + ?Sized>(
    repo: &R,
    course: &Course,
    options: &PortalOptions,
) -> PortalResult<Option<u32>> {
    Ok(repo
        .find_room(&course.details.room)
        .await?
        .map(|room| room.capacity_or(options.default_room_capacity)))
}

/// Enroll a student in a course.
pub async fn enroll<R: FullRepository + ?Sized>(
    repo: &R,
    student_id: &StudentId,
    course_id: &CourseId,
    options: &PortalOptions,
) -> PortalResult<EnrollmentRef> {
    info!(
        "Service layer: enrolling student {} in course {}",
        student_id, course_id
    );

    if repo.find_student(student_id).await?.is_none() {
        return Err(PortalError::StudentNotFound(student_id.clone()));
    }

    let course = repo
        .find_course(course_id)
        .await?
        .ok_or_else(|| PortalError::CourseNotFound(course_id.clone()))?;

    let already_enrolled = || PortalError::AlreadyEnrolled {
        student_id: student_id.clone(),
        course_id: course_id.clone(),
    };

    if repo.find_enrollment(student_id, course_id).await?.is_some() {
        return Err(already_enrolled());
    }

    let capacity = course_capacity(repo, &course, options).await?;
    if let Some(capacity) = capacity {
        if course.registered() >= capacity {
            return Err(PortalError::CourseFull {
                course_id: course_id.clone(),
                capacity,
            });
        }
    }

    if let Some(conflicting) = has_time_conflict(repo, student_id, &course).await? {
        return Err(PortalError::ScheduleConflict {
            course_id: course_id.clone(),
            conflicting,
        });
    }

    let enrollment = Enrollment::new(student_id.clone(), course_id.clone());
    match repo.commit_enrollment(&enrollment, capacity).await? {
        EnrollmentCommit::Committed {
            registered_students_count,
        } => {
            info!(
                "Service layer: enrolled {} in {} ({}/{})",
                student_id,
                course_id,
                registered_students_count,
                capacity.map_or_else(|| "unbounded".to_string(), |c| c.to_string())
            );
            Ok(EnrollmentRef {
                e_id: enrollment.e_id,
                student_id: enrollment.student_id,
                course_id: enrollment.course_id,
                registered_students_count,
            })
        }
        EnrollmentCommit::AlreadyEnrolled => {
            debug!("Service layer: lost enrollment race on duplicate pair");
            Err(already_enrolled())
        }
        EnrollmentCommit::CapacityReached { capacity } => {
            debug!("Service layer: lost enrollment race on last seat");
            Err(PortalError::CourseFull {
                course_id: course_id.clone(),
                capacity,
            })
        }
        EnrollmentCommit::ScheduleConflict { conflicting } => {
            debug!("Service layer: lost enrollment race on an overlapping course");
            Err(PortalError::ScheduleConflict {
                course_id: course_id.clone(),
                conflicting,
            })
        }
        EnrollmentCommit::CourseMissing => Err(PortalError::CourseNotFound(course_id.clone())),
    }
}
