//! Grade reports and registration menus.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::error::{PortalError, PortalResult};
use crate::db::repository::FullRepository;
use crate::models::{Course, CourseId, Grade, StudentId};

/// Name shown when an enrollment points at a course that no longer exists.
pub const UNKNOWN_COURSE_NAME: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceCard {
    pub course_id: CourseId,
    pub course_name: String,
    pub total_grade: Grade,
}

/// One card per enrollment of the student, ordered by course id.
pub async fn student_performance<R: FullRepository + ?Sized>(
    repo: &R,
    student_id: &StudentId,
) -> PortalResult<Vec<PerformanceCard>> {
    info!("Service layer: building grade report for {}", student_id);
    let enrollments = repo.enrollments_for_student(student_id).await?;
    let ids: Vec<CourseId> = enrollments.iter().map(|e| e.course_id.clone()).collect();
    let names: BTreeMap<CourseId, String> = repo
        .courses_by_ids(&ids)
        .await?
        .into_iter()
        .map(|c| (c.course_id, c.details.course_name))
        .collect();

    Ok(enrollments
        .into_iter()
        .map(|e| PerformanceCard {
            course_name: names
                .get(&e.course_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_COURSE_NAME.to_string()),
            course_id: e.course_id,
            total_grade: e.grade,
        })
        .collect())
}

/// Card for a single enrollment.
pub async fn student_course_performance<R: FullRepository + ?Sized>(
    repo: &R,
    student_id: &StudentId,
    course_id: &CourseId,
) -> PortalResult<PerformanceCard> {
    let enrollment = repo
        .find_enrollment(student_id, course_id)
        .await?
        .ok_or_else(|| PortalError::NotEnrolled {
            student_id: student_id.clone(),
            course_id: course_id.clone(),
        })?;

    let course_name = repo
        .find_course(course_id)
        .await?
        .map(|c| c.details.course_name)
        .unwrap_or_else(|| UNKNOWN_COURSE_NAME.to_string());

    Ok(PerformanceCard {
        course_id: enrollment.course_id,
        course_name,
        total_grade: enrollment.grade,
    })
}

/// Every course the student is not yet enrolled in, ordered by course id.
pub async fn available_courses_for_registration<R: FullRepository + ?Sized>(
    repo: &R,
    student_id: &StudentId,
) -> PortalResult<Vec<Course>> {
    let enrolled: BTreeSet<CourseId> = repo
        .enrollments_for_student(student_id)
        .await?
        .into_iter()
        .map(|e| e.course_id)
        .collect();

    Ok(repo
        .list_courses()
        .await?
        .into_iter()
        .filter(|c| !enrolled.contains(&c.course_id))
        .collect())
}

/// Courses for the given ids; unknown ids are skipped.
pub async fn list_courses<R: FullRepository + ?Sized>(
    repo: &R,
    course_ids: &[CourseId],
) -> PortalResult<Vec<Course>> {
    if course_ids.is_empty() {
        return Ok(Vec::new());
    }
    Ok(repo.courses_by_ids(course_ids).await?)
}
