//! Admission policy knobs shared by the services.

use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_ROOM_CAPACITY;

/// How existing courses mark instructors busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InstructorMatching {
    /// By stored instructor identifier. Courses without one fall back to the
    /// display name.
    #[default]
    #[serde(rename = "id")]
    ById,
    /// By display name only.
    #[serde(rename = "name")]
    ByName,
}

/// Policy applied by course creation and enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortalOptions {
    /// Seat count for rooms stored without a capacity.
    pub default_room_capacity: u32,
    pub instructor_matching: InstructorMatching,
}

impl Default for PortalOptions {
    fn default() -> Self {
        Self {
            default_room_capacity: DEFAULT_ROOM_CAPACITY,
            instructor_matching: InstructorMatching::default(),
        }
    }
}

impl PortalOptions {
    pub fn with_matching(mut self, matching: InstructorMatching) -> Self {
        self.instructor_matching = matching;
        self
    }

    pub fn with_default_room_capacity(mut self, capacity: u32) -> Self {
        self.default_room_capacity = capacity;
        self
    }
}
