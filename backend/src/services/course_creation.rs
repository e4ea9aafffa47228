//! Course creation gate.
//!
//! A course request passes, in order: required-field validation, the
//! duplicate check, room availability and instructor availability. The first
//! failing gate rejects the request and nothing is written.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::availability::{available_instructors, available_rooms};
use super::error::{PortalError, PortalResult};
use super::options::{InstructorMatching, PortalOptions};
use crate::db::repository::FullRepository;
use crate::models::{
    Course, CourseDetails, CourseId, CourseKey, Instructor, InstructorId, RoomId, Schedule,
};

/// Weekly slot as submitted by a client; every part is optional until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub days: Option<Vec<String>>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl ScheduleRequest {
    pub fn new(days: &[&str], start_time: &str, end_time: &str) -> Self {
        Self {
            days: Some(days.iter().map(|d| d.to_string()).collect()),
            start_time: Some(start_time.to_string()),
            end_time: Some(end_time.to_string()),
        }
    }

    /// Validate into a [`Schedule`], naming missing parts under `prefix`.
    pub fn to_schedule(&self, prefix: &str) -> PortalResult<Schedule> {
        let days = self
            .days
            .as_ref()
            .ok_or_else(|| PortalError::missing(&format!("{}.days", prefix)))?;
        let start = self
            .start_time
            .as_deref()
            .ok_or_else(|| PortalError::missing(&format!("{}.start_time", prefix)))?;
        let end = self
            .end_time
            .as_deref()
            .ok_or_else(|| PortalError::missing(&format!("{}.end_time", prefix)))?;
        Ok(Schedule::parse(days.iter().map(String::as_str), start, end)?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseDetailsRequest {
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub schedule: Option<ScheduleRequest>,
    #[serde(default)]
    pub room: Option<String>,
    #[serde(default)]
    pub instructor_name: Option<String>,
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub registered_students_count: Option<u32>,
}

/// Course document as submitted by a dean.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseRequest {
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub details: Option<CourseDetailsRequest>,
}

/// A request that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCourse {
    pub course_id: CourseId,
    pub course_name: String,
    pub section: Option<String>,
    pub schedule: Schedule,
    pub room: RoomId,
    pub instructor_name: String,
    pub instructor_id: Option<InstructorId>,
    pub requested_count: u32,
}

fn required<'a>(value: &'a Option<String>, field: &str) -> PortalResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(PortalError::missing(field)),
    }
}

impl CourseRequest {
    /// Check that every required field is present and the schedule is well formed.
    pub fn validate(&self) -> PortalResult<NewCourse> {
        let course_id = required(&self.course_id, "course_id")?;
        let details = self
            .details
            .as_ref()
            .ok_or_else(|| PortalError::missing("details"))?;
        let course_name = required(&details.course_name, "details.course_name")?;
        let schedule = details
            .schedule
            .as_ref()
            .ok_or_else(|| PortalError::missing("details.schedule"))?;
        let room = required(&details.room, "details.room")?;
        let instructor_name = required(&details.instructor_name, "details.instructor_name")?;
        let requested_count = details
            .registered_students_count
            .ok_or_else(|| PortalError::missing("details.registered_students_count"))?;
        let schedule = schedule.to_schedule("details.schedule")?;

        Ok(NewCourse {
            course_id: CourseId::from(course_id),
            course_name: course_name.to_string(),
            section: details.section.clone(),
            schedule,
            room: RoomId::from(room),
            instructor_name: instructor_name.to_string(),
            instructor_id: details
                .instructor_id
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(InstructorId::from),
            requested_count,
        })
    }
}

/// Keys of a freshly created course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub c_id: CourseKey,
    pub course_id: CourseId,
}

/// Pick the instructor this course binds to and check they are free.
///
/// A given `instructor_id` must belong to a known profile whose full name is
/// the requested `instructor_name`. Returns the identifier to store on the
/// course.
async fn resolve_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    course: &NewCourse,
    matching: InstructorMatching,
    available: &[Instructor],
) -> PortalResult<Option<InstructorId>> {
    let busy = || PortalError::InstructorBusy {
        instructor: course.instructor_name.clone(),
        schedule: course.schedule.clone(),
    };

    // An explicit id must name the same person as the display name
    if let Some(id) = &course.instructor_id {
        let profile = repo.find_instructor(id).await?.ok_or_else(&busy)?;
        if profile.full_name != course.instructor_name {
            return Err(PortalError::invalid(
                "details.instructor_name",
                format!(
                    "'{}' does not match instructor {} ({})",
                    course.instructor_name, id, profile.full_name
                ),
            ));
        }
    }

    match matching {
        InstructorMatching::ByName => {
            let free: Vec<&Instructor> = available
                .iter()
                .filter(|i| i.full_name == course.instructor_name)
                .collect();
            if free.is_empty() {
                return Err(busy());
            }
            let inferred = match free.as_slice() {
                [only] => Some(only.instructor_id.clone()),
                _ => None,
            };
            Ok(course.instructor_id.clone().or(inferred))
        }
        InstructorMatching::ById => {
            let id = match &course.instructor_id {
                Some(id) => id.clone(),
                None => {
                    let mut named: Vec<Instructor> = repo
                        .list_instructors()
                        .await?
                        .into_iter()
                        .filter(|i| i.full_name == course.instructor_name)
                        .collect();
                    match named.len() {
                        0 => return Err(busy()),
                        1 => named.remove(0).instructor_id,
                        n => {
                            warn!(
                                "Service layer: instructor name '{}' matches {} profiles",
                                course.instructor_name, n
                            );
                            return Err(PortalError::missing("details.instructor_id"));
                        }
                    }
                }
            };
            if available.iter().any(|i| i.instructor_id == id) {
                Ok(Some(id))
            } else {
                Err(busy())
            }
        }
    }
}

/// Validate and persist a new course.
///
/// The stored `registered_students_count` is always 0; only admission moves it.
pub async fn create_course<R: FullRepository + ?Sized>(
    repo: &R,
    request: &CourseRequest,
    options: &PortalOptions,
) -> PortalResult<CourseRef> {
    let new_course = request.validate()?;
    info!(
        "Service layer: creating course {} in room {} at {}",
        new_course.course_id, new_course.room, new_course.schedule
    );

    if repo.find_course(&new_course.course_id).await?.is_some() {
        return Err(PortalError::duplicate("Course", &new_course.course_id));
    }

    let rooms = available_rooms(repo, &new_course.schedule).await?;
    if !rooms.iter().any(|r| r.room == new_course.room) {
        return Err(PortalError::RoomUnavailable {
            room: new_course.room,
            schedule: new_course.schedule,
        });
    }

    let instructors =
        available_instructors(repo, &new_course.schedule, options.instructor_matching).await?;
    let instructor_id =
        resolve_instructor(repo, &new_course, options.instructor_matching, &instructors).await?;

    if new_course.requested_count != 0 {
        warn!(
            "Service layer: ignoring registered_students_count={} on new course {}",
            new_course.requested_count, new_course.course_id
        );
    }

    let course = Course {
        c_id: CourseKey::generate(),
        course_id: new_course.course_id,
        details: CourseDetails {
            course_name: new_course.course_name,
            section: new_course.section,
            schedule: new_course.schedule,
            room: new_course.room,
            instructor_name: new_course.instructor_name,
            instructor_id,
            registered_students_count: 0,
        },
    };

    match repo.insert_course(&course).await {
        Ok(()) => {}
        Err(e) if e.is_conflict() => {
            return Err(PortalError::duplicate("Course", &course.course_id));
        }
        Err(e) => return Err(e.into()),
    }

    info!(
        "Service layer: course {} created as {}",
        course.course_id, course.c_id
    );
    Ok(CourseRef {
        c_id: course.c_id,
        course_id: course.course_id,
    })
}
