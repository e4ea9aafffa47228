pub mod catalog;
pub mod course;
pub mod enrollment;
pub mod macros;
pub mod schedule;

pub use catalog::*;
pub use course::*;
pub use enrollment::*;
pub use schedule::*;

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod schedule_tests;
