//! Course documents.

use serde::{Deserialize, Serialize};

use super::catalog::{InstructorId, RoomId};
use super::schedule::Schedule;
use crate::define_id_type;

define_id_type!(CourseId);
define_id_type!(CourseKey, "course");

/// Mutable and descriptive part of a course document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDetails {
    pub course_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub schedule: Schedule,
    pub room: RoomId,
    pub instructor_name: String,
    /// Stable instructor reference. Absent on records created before ids were stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_id: Option<InstructorId>,
    pub registered_students_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub c_id: CourseKey,
    pub course_id: CourseId,
    pub details: CourseDetails,
}

impl Course {
    pub fn schedule(&self) -> &Schedule {
        &self.details.schedule
    }

    pub fn registered(&self) -> u32 {
        self.details.registered_students_count
    }
}
