//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use university_portal::db::LocalRepository;
use university_portal::models::{
    Course, CourseDetails, CourseId, CourseKey, InstructorId, Room, RoomId, Schedule,
};
use university_portal::services::{CourseDetailsRequest, CourseRequest, ScheduleRequest};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Schedule from day names and `HH:MM` bounds. Panics on malformed input.
pub fn schedule(days: &[&str], start: &str, end: &str) -> Schedule {
    Schedule::parse(days.iter().copied(), start, end).expect("valid schedule")
}

/// Course document with an explicit instructor id.
pub fn course(
    course_id: &str,
    room: &str,
    instructor: Option<(&str, &str)>,
    slot: Schedule,
) -> Course {
    let (instructor_id, instructor_name) = match instructor {
        Some((id, name)) => (Some(InstructorId::from(id)), name.to_string()),
        None => (None, "Staff".to_string()),
    };
    Course {
        c_id: CourseKey::generate(),
        course_id: CourseId::from(course_id),
        details: CourseDetails {
            course_name: format!("{} lecture", course_id),
            section: None,
            schedule: slot,
            room: RoomId::from(room),
            instructor_name,
            instructor_id,
            registered_students_count: 0,
        },
    }
}

/// Legacy course document that names its instructor but stores no id.
pub fn legacy_course(course_id: &str, room: &str, instructor_name: &str, slot: Schedule) -> Course {
    let mut course = course(course_id, room, None, slot);
    course.details.instructor_name = instructor_name.to_string();
    course
}

/// Complete course creation request.
pub fn course_request(
    course_id: &str,
    room: &str,
    instructor_name: &str,
    instructor_id: Option<&str>,
    slot: (&[&str], &str, &str),
) -> CourseRequest {
    CourseRequest {
        course_id: Some(course_id.to_string()),
        details: Some(CourseDetailsRequest {
            course_name: Some(format!("{} lecture", course_id)),
            section: Some("1".to_string()),
            schedule: Some(ScheduleRequest::new(slot.0, slot.1, slot.2)),
            room: Some(room.to_string()),
            instructor_name: Some(instructor_name.to_string()),
            instructor_id: instructor_id.map(str::to_string),
            registered_students_count: Some(0),
        }),
    }
}

/// Store with rooms R1 (2 seats), R2 (30 seats) and R3 (no capacity on
/// record), instructors I1 "Dr. A" and I2 "Dr. B", and students S1 to S3.
pub fn campus() -> LocalRepository {
    let repo = LocalRepository::new();
    repo.seed_room(Room::new("R1", 2)).expect("valid room");
    repo.seed_room(Room::new("R2", 30)).expect("valid room");
    repo.seed_room(Room {
        room: RoomId::from("R3"),
        capacity: None,
    })
    .expect("valid room");
    repo.seed_instructor("I1", "Dr. A");
    repo.seed_instructor("I2", "Dr. B");
    repo.seed_student("S1", "Ada Lovelace");
    repo.seed_student("S2", "Alan Turing");
    repo.seed_student("S3", "Grace Hopper");
    repo
}
