//! Public result payloads.
//!
//! Every mutating service call can be folded into an [`ActionOutcome`], the
//! JSON shape consumed by the cache and graph collaborators:
//!
//! ```json
//! {"success": true, "message": "Course Created!", "ids": {"c_id": "course_…", "course_id": "CS101"}}
//! {"success": false, "error": "Course CS101 is full (capacity: 2)", "kind": "COURSE_FULL"}
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use crate::services::{
    CourseRef, EnrollmentRef, ErrorKind, PerformanceCard, PortalError, Registration,
};
use crate::models::{Account, Instructor, Student};

/// Structured result of a portal action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Set only for store failures the caller may retry.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ids: BTreeMap<String, String>,
}

impl ActionOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            kind: None,
            retryable: false,
            ids: BTreeMap::new(),
        }
    }

    pub fn failure(err: &PortalError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(err.to_string()),
            kind: Some(err.kind()),
            retryable: err.is_retryable(),
            ids: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, name: &str, value: impl ToString) -> Self {
        self.ids.insert(name.to_string(), value.to_string());
        self
    }

    /// Fold a service result into an outcome.
    pub fn from_result<T: Into<ActionOutcome>>(result: Result<T, PortalError>) -> Self {
        match result {
            Ok(value) => value.into(),
            Err(err) => Self::failure(&err),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "success": self.success })
        })
    }
}

impl From<&PortalError> for ActionOutcome {
    fn from(err: &PortalError) -> Self {
        Self::failure(err)
    }
}

impl From<PortalError> for ActionOutcome {
    fn from(err: PortalError) -> Self {
        Self::failure(&err)
    }
}

impl From<CourseRef> for ActionOutcome {
    fn from(course: CourseRef) -> Self {
        Self::ok("Course Created!")
            .with_id("c_id", &course.c_id)
            .with_id("course_id", &course.course_id)
    }
}

impl From<EnrollmentRef> for ActionOutcome {
    fn from(enrollment: EnrollmentRef) -> Self {
        Self::ok("Enrolled Successfully")
            .with_id("e_id", &enrollment.e_id)
            .with_id("student_id", &enrollment.student_id)
            .with_id("course_id", &enrollment.course_id)
    }
}

impl From<Student> for ActionOutcome {
    fn from(student: Student) -> Self {
        Self::ok("Student Created!")
            .with_id("s_id", &student.s_id)
            .with_id("student_id", &student.student_id)
    }
}

impl From<Instructor> for ActionOutcome {
    fn from(instructor: Instructor) -> Self {
        Self::ok("Instructor Created!")
            .with_id("i_id", &instructor.i_id)
            .with_id("instructor_id", &instructor.instructor_id)
    }
}

impl From<Account> for ActionOutcome {
    fn from(account: Account) -> Self {
        Self::ok("User created successfully")
            .with_id("u_id", &account.u_id)
            .with_id("user_id", &account.user_id)
    }
}

impl From<Registration> for ActionOutcome {
    fn from(registration: Registration) -> Self {
        Self::ok(format!(
            "{} and user created successfully",
            registration.role
        ))
        .with_id("profile_key", &registration.profile_key)
        .with_id("user_id", &registration.user_id)
    }
}
