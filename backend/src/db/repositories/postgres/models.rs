use chrono::NaiveTime;
use diesel::prelude::*;

use super::schema::{accounts, courses, enrollments, instructors, rooms, students};

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = rooms)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RoomRow {
    pub room: String,
    pub capacity: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = instructors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct InstructorRow {
    pub i_id: String,
    pub instructor_id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StudentRow {
    pub s_id: String,
    pub student_id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CourseRow {
    pub c_id: String,
    pub course_id: String,
    pub course_name: String,
    pub section: Option<String>,
    pub days: Vec<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub room: String,
    pub instructor_name: String,
    pub instructor_id: Option<String>,
    pub registered_students_count: i32,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = enrollments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EnrollmentRow {
    pub e_id: String,
    pub student_id: String,
    pub course_id: String,
    pub grade: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccountRow {
    pub u_id: String,
    pub user_id: String,
    pub role: String,
    pub credential_ref: Option<String>,
}
