//! Catalog entities: rooms, people and login accounts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::define_id_type;

define_id_type!(RoomId);
define_id_type!(InstructorId);
define_id_type!(StudentId);
define_id_type!(UserId);

define_id_type!(InstructorKey, "instructor");
define_id_type!(StudentKey, "student");
define_id_type!(AccountKey, "user");

/// Seat count used when a room record carries no capacity.
pub const DEFAULT_ROOM_CAPACITY: u32 = 20;

/// Lecture room. Immutable once seeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room: RoomId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

impl Room {
    pub fn new(room: impl Into<RoomId>, capacity: u32) -> Self {
        debug_assert!(capacity > 0, "room capacity must be positive");
        Self {
            room: room.into(),
            capacity: Some(capacity),
        }
    }

    /// Reject a record whose capacity is present but zero.
    pub fn validate(&self) -> Result<(), String> {
        match self.capacity {
            Some(0) => Err(format!("Room {} must have a positive capacity", self.room)),
            _ => Ok(()),
        }
    }

    /// Seat count, falling back to `default` when the record has none.
    pub fn capacity_or(&self, default: u32) -> u32 {
        self.capacity.unwrap_or(default)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub i_id: InstructorKey,
    pub instructor_id: InstructorId,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub s_id: StudentKey,
    pub student_id: StudentId,
    pub full_name: String,
}

/// Portal role attached to a login account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Instructor,
    Dean,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Dean => "dean",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "instructor" => Ok(Role::Instructor),
            "dean" => Ok(Role::Dean),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Login account bound to a student/instructor profile (or a dean).
///
/// Credentials are issued and verified by an external service; the account
/// only keeps the opaque reference it hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub u_id: AccountKey,
    pub user_id: UserId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_ref: Option<String>,
}
