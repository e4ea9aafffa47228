use serde::{Deserialize, Serialize};
use std::fmt;

use super::catalog::StudentId;
use super::course::CourseId;
use crate::define_id_type;

define_id_type!(EnrollmentKey, "enrollment");

/// Course grade. `"00"` marks an enrollment that has not been graded yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grade(pub String);

impl Grade {
    pub const UNGRADED: &'static str = "00";

    pub fn ungraded() -> Self {
        Grade(Self::UNGRADED.to_string())
    }

    pub fn is_graded(&self) -> bool {
        self.0 != Self::UNGRADED
    }
}

impl Default for Grade {
    fn default() -> Self {
        Self::ungraded()
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link between a student and a course; unique per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub e_id: EnrollmentKey,
    pub student_id: StudentId,
    pub course_id: CourseId,
    #[serde(default)]
    pub grade: Grade,
}

impl Enrollment {
    /// New ungraded enrollment with a freshly generated key.
    pub fn new(student_id: StudentId, course_id: CourseId) -> Self {
        Self {
            e_id: EnrollmentKey::generate(),
            student_id,
            course_id,
            grade: Grade::ungraded(),
        }
    }
}
