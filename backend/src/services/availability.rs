//! Availability resolver.
//!
//! Given a candidate weekly slot, works out which rooms and instructors are not
//! already committed to an overlapping course. Courses are pre-filtered in the
//! store by shared weekday, then checked in memory with
//! [`Schedule::conflicts_with`].

use log::debug;
use std::collections::BTreeSet;

use super::error::PortalResult;
use super::options::InstructorMatching;
use crate::db::repository::FullRepository;
use crate::models::{Course, Instructor, InstructorId, Room, RoomId, Schedule};

/// Courses whose schedule conflicts with `schedule`, ordered by course id.
pub async fn conflicting_courses<R: FullRepository + ?Sized>(
    repo: &R,
    schedule: &Schedule,
) -> PortalResult<Vec<Course>> {
    let candidates = repo.courses_meeting_on(schedule.days()).await?;
    let mut busy: Vec<Course> = candidates
        .into_iter()
        .filter(|c| c.schedule().conflicts_with(schedule))
        .collect();
    busy.sort_by(|a, b| a.course_id.cmp(&b.course_id));
    Ok(busy)
}

/// Rooms with no conflicting course, ordered by room identifier.
///
/// Returns an empty list when every room is busy.
pub async fn available_rooms<R: FullRepository + ?Sized>(
    repo: &R,
    schedule: &Schedule,
) -> PortalResult<Vec<Room>> {
    let rooms = repo.list_rooms().await?;
    let busy: BTreeSet<RoomId> = conflicting_courses(repo, schedule)
        .await?
        .into_iter()
        .map(|c| c.details.room)
        .collect();

    let mut free: Vec<Room> = rooms
        .into_iter()
        .filter(|r| !busy.contains(&r.room))
        .collect();
    free.sort_by(|a, b| a.room.cmp(&b.room));

    debug!(
        "Service layer: {} room(s) free at {} ({} busy)",
        free.len(),
        schedule,
        busy.len()
    );
    Ok(free)
}

/// Busy markers collected from conflicting courses.
#[derive(Debug, Default)]
struct BusyInstructors {
    ids: BTreeSet<InstructorId>,
    names: BTreeSet<String>,
}

impl BusyInstructors {
    fn collect(courses: Vec<Course>, matching: InstructorMatching) -> Self {
        let mut busy = Self::default();
        for course in courses {
            let details = course.details;
            match (matching, details.instructor_id) {
                (InstructorMatching::ById, Some(id)) => {
                    busy.ids.insert(id);
                }
                // Legacy records carry only the display name
                _ => {
                    busy.names.insert(details.instructor_name);
                }
            }
        }
        busy
    }

    fn contains(&self, instructor: &Instructor) -> bool {
        self.ids.contains(&instructor.instructor_id) || self.names.contains(&instructor.full_name)
    }
}

/// Instructors with no conflicting course, ordered by instructor identifier.
pub async fn available_instructors<R: FullRepository + ?Sized>(
    repo: &R,
    schedule: &Schedule,
    matching: InstructorMatching,
) -> PortalResult<Vec<Instructor>> {
    let instructors = repo.list_instructors().await?;
    let busy = BusyInstructors::collect(conflicting_courses(repo, schedule).await?, matching);

    let mut free: Vec<Instructor> = instructors
        .into_iter()
        .filter(|i| !busy.contains(i))
        .collect();
    free.sort_by(|a, b| a.instructor_id.cmp(&b.instructor_id));

    debug!(
        "Service layer: {} instructor(s) free at {} (matching={:?})",
        free.len(),
        schedule,
        matching
    );
    Ok(free)
}
