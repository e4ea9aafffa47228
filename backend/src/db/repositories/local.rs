//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data lives in ordered
//! maps behind a single lock, which gives fast, deterministic and isolated
//! execution and makes every multi-record write atomic.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::db::repository::*;
use crate::models::{
    Account, Course, CourseId, Enrollment, Instructor, InstructorId, InstructorKey, Room, RoomId,
    Student, StudentId, StudentKey, UserId, Weekday,
};

/// In-memory local repository.
///
/// Cloning is cheap and clones share the same underlying data, so one
/// instance can be handed to many concurrent tasks.
///
/// # Example
/// ```
/// use university_portal::db::repositories::LocalRepository;
/// use university_portal::models::Room;
///
/// let repo = LocalRepository::new();
/// repo.seed_room(Room::new("R1", 2)).unwrap();
/// assert_eq!(repo.room_count(), 1);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    rooms: BTreeMap<RoomId, Room>,
    instructors: BTreeMap<InstructorId, Instructor>,
    students: BTreeMap<StudentId, Student>,
    courses: BTreeMap<CourseId, Course>,
    // Keyed by pair so uniqueness is structural
    enrollments: BTreeMap<(StudentId, CourseId), Enrollment>,
    accounts: BTreeMap<UserId, Account>,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            rooms: BTreeMap::new(),
            instructors: BTreeMap::new(),
            students: BTreeMap::new(),
            courses: BTreeMap::new(),
            enrollments: BTreeMap::new(),
            accounts: BTreeMap::new(),
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    // ==================== Seeding helpers ====================

    /// Add or replace a room. Bypasses health checks but not validation.
    pub fn seed_room(&self, room: Room) -> RepositoryResult<()> {
        validate_room(&room, "seed_room")?;
        let mut data = self.data.write();
        data.rooms.insert(room.room.clone(), room);
        Ok(())
    }

    /// Add a student profile with a generated key and return it.
    pub fn seed_student(&self, student_id: &str, full_name: &str) -> Student {
        let student = Student {
            s_id: StudentKey::generate(),
            student_id: StudentId::from(student_id),
            full_name: full_name.to_string(),
        };
        let mut data = self.data.write();
        data.students
            .insert(student.student_id.clone(), student.clone());
        student
    }

    /// Add an instructor profile with a generated key and return it.
    pub fn seed_instructor(&self, instructor_id: &str, full_name: &str) -> Instructor {
        let instructor = Instructor {
            i_id: InstructorKey::generate(),
            instructor_id: InstructorId::from(instructor_id),
            full_name: full_name.to_string(),
        };
        let mut data = self.data.write();
        data.instructors
            .insert(instructor.instructor_id.clone(), instructor.clone());
        instructor
    }

    /// Store a course document as-is, skipping the creation gates.
    ///
    /// Useful to reproduce legacy records (e.g. courses without an
    /// `instructor_id`).
    pub fn seed_course(&self, course: Course) {
        let mut data = self.data.write();
        data.courses.insert(course.course_id.clone(), course);
    }

    /// Store an enrollment as-is (e.g. already graded), skipping admission.
    ///
    /// The course's registered count is left untouched.
    pub fn seed_enrollment(&self, enrollment: Enrollment) {
        let mut data = self.data.write();
        data.enrollments.insert(
            (enrollment.student_id.clone(), enrollment.course_id.clone()),
            enrollment,
        );
    }

    // ==================== Test controls ====================

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn room_count(&self) -> usize {
        self.data.read().rooms.len()
    }

    pub fn course_count(&self) -> usize {
        self.data.read().courses.len()
    }

    pub fn enrollment_count(&self) -> usize {
        self.data.read().enrollments.len()
    }

    pub fn student_count(&self) -> usize {
        self.data.read().students.len()
    }

    pub fn instructor_count(&self) -> usize {
        self.data.read().instructors.len()
    }

    pub fn account_count(&self) -> usize {
        self.data.read().accounts.len()
    }

    /// Current registered count of a course, if it exists.
    pub fn registered_count(&self, course_id: &str) -> Option<u32> {
        self.data
            .read()
            .courses
            .get(course_id)
            .map(|c| c.details.registered_students_count)
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self, operation: &str) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Local store is not healthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(operation: &str, entity: &str, id: impl ToString) -> RepositoryError {
    let id = id.to_string();
    RepositoryError::conflict_with_context(
        format!("{} '{}' already exists", entity, id),
        ErrorContext::new(operation)
            .with_entity(entity)
            .with_entity_id(id),
    )
}

fn validate_room(room: &Room, operation: &str) -> RepositoryResult<()> {
    room.validate().map_err(|message| {
        RepositoryError::validation(message).with_operation(operation)
    })
}

impl LocalData {
    /// First course (by id) held by the student that overlaps `target` in time.
    fn first_conflict(&self, student_id: &StudentId, target: &Course) -> Option<CourseId> {
        self.enrollments
            .keys()
            .filter(|(student, course)| student == student_id && course != &target.course_id)
            .filter_map(|(_, course)| self.courses.get(course))
            .find(|course| course.schedule().conflicts_with(target.schedule()))
            .map(|course| course.course_id.clone())
    }

    fn check_student_free(&self, student: &Student, operation: &str) -> RepositoryResult<()> {
        if self.students.contains_key(&student.student_id) {
            return Err(duplicate(operation, "student", &student.student_id));
        }
        Ok(())
    }

    fn check_instructor_free(
        &self,
        instructor: &Instructor,
        operation: &str,
    ) -> RepositoryResult<()> {
        if self.instructors.contains_key(&instructor.instructor_id) {
            return Err(duplicate(operation, "instructor", &instructor.instructor_id));
        }
        Ok(())
    }

    fn check_account_free(&self, account: &Account, operation: &str) -> RepositoryResult<()> {
        if self.accounts.contains_key(&account.user_id) {
            return Err(duplicate(operation, "account", &account.user_id));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn insert_room(&self, room: &Room) -> RepositoryResult<()> {
        self.check_health("insert_room")?;
        validate_room(room, "insert_room")?;
        let mut data = self.data.write();
        if data.rooms.contains_key(&room.room) {
            return Err(duplicate("insert_room", "room", &room.room));
        }
        data.rooms.insert(room.room.clone(), room.clone());
        Ok(())
    }

    async fn find_room(&self, room: &RoomId) -> RepositoryResult<Option<Room>> {
        self.check_health("find_room")?;
        Ok(self.data.read().rooms.get(room).cloned())
    }

    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>> {
        self.check_health("list_rooms")?;
        Ok(self.data.read().rooms.values().cloned().collect())
    }

    async fn find_instructor(
        &self,
        instructor_id: &InstructorId,
    ) -> RepositoryResult<Option<Instructor>> {
        self.check_health("find_instructor")?;
        Ok(self.data.read().instructors.get(instructor_id).cloned())
    }

    async fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>> {
        self.check_health("list_instructors")?;
        Ok(self.data.read().instructors.values().cloned().collect())
    }

    async fn find_student(&self, student_id: &StudentId) -> RepositoryResult<Option<Student>> {
        self.check_health("find_student")?;
        Ok(self.data.read().students.get(student_id).cloned())
    }
}

#[async_trait]
impl CourseRepository for LocalRepository {
    async fn insert_course(&self, course: &Course) -> RepositoryResult<()> {
        self.check_health("insert_course")?;
        let mut data = self.data.write();
        if data.courses.contains_key(&course.course_id) {
            return Err(duplicate("insert_course", "course", &course.course_id));
        }
        data.courses
            .insert(course.course_id.clone(), course.clone());
        Ok(())
    }

    async fn find_course(&self, course_id: &CourseId) -> RepositoryResult<Option<Course>> {
        self.check_health("find_course")?;
        Ok(self.data.read().courses.get(course_id).cloned())
    }

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        self.check_health("list_courses")?;
        Ok(self.data.read().courses.values().cloned().collect())
    }

    async fn courses_by_ids(&self, course_ids: &[CourseId]) -> RepositoryResult<Vec<Course>> {
        self.check_health("courses_by_ids")?;
        let wanted: BTreeSet<&CourseId> = course_ids.iter().collect();
        let data = self.data.read();
        Ok(wanted
            .into_iter()
            .filter_map(|id| data.courses.get(id).cloned())
            .collect())
    }

    async fn courses_meeting_on(&self, days: &BTreeSet<Weekday>) -> RepositoryResult<Vec<Course>> {
        self.check_health("courses_meeting_on")?;
        let data = self.data.read();
        Ok(data
            .courses
            .values()
            .filter(|c| !c.schedule().days().is_disjoint(days))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl EnrollmentRepository for LocalRepository {
    async fn find_enrollment(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> RepositoryResult<Option<Enrollment>> {
        self.check_health("find_enrollment")?;
        let key = (student_id.clone(), course_id.clone());
        Ok(self.data.read().enrollments.get(&key).cloned())
    }

    async fn enrollments_for_student(
        &self,
        student_id: &StudentId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        self.check_health("enrollments_for_student")?;
        let data = self.data.read();
        Ok(data
            .enrollments
            .values()
            .filter(|e| &e.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn commit_enrollment(
        &self,
        enrollment: &Enrollment,
        capacity: Option<u32>,
    ) -> RepositoryResult<EnrollmentCommit> {
        self.check_health("commit_enrollment")?;

        // Checks and both writes happen under one write guard.
        let mut data = self.data.write();
        let key = (enrollment.student_id.clone(), enrollment.course_id.clone());
        if data.enrollments.contains_key(&key) {
            return Ok(EnrollmentCommit::AlreadyEnrolled);
        }

        let Some(target) = data.courses.get(&enrollment.course_id) else {
            return Ok(EnrollmentCommit::CourseMissing);
        };
        if let Some(conflicting) = data.first_conflict(&enrollment.student_id, target) {
            return Ok(EnrollmentCommit::ScheduleConflict { conflicting });
        }

        let Some(course) = data.courses.get_mut(&enrollment.course_id) else {
            return Ok(EnrollmentCommit::CourseMissing);
        };
        let current = course.details.registered_students_count;
        if let Some(capacity) = capacity {
            if current >= capacity {
                return Ok(EnrollmentCommit::CapacityReached { capacity });
            }
        }
        course.details.registered_students_count = current + 1;

        data.enrollments.insert(key, enrollment.clone());
        Ok(EnrollmentCommit::Committed {
            registered_students_count: current + 1,
        })
    }
}

#[async_trait]
impl RegistrationRepository for LocalRepository {
    async fn insert_student(&self, student: &Student) -> RepositoryResult<()> {
        self.check_health("insert_student")?;
        let mut data = self.data.write();
        data.check_student_free(student, "insert_student")?;
        data.students
            .insert(student.student_id.clone(), student.clone());
        Ok(())
    }

    async fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<()> {
        self.check_health("insert_instructor")?;
        let mut data = self.data.write();
        data.check_instructor_free(instructor, "insert_instructor")?;
        data.instructors
            .insert(instructor.instructor_id.clone(), instructor.clone());
        Ok(())
    }

    async fn find_account(&self, user_id: &UserId) -> RepositoryResult<Option<Account>> {
        self.check_health("find_account")?;
        Ok(self.data.read().accounts.get(user_id).cloned())
    }

    async fn insert_account(&self, account: &Account) -> RepositoryResult<()> {
        self.check_health("insert_account")?;
        let mut data = self.data.write();
        data.check_account_free(account, "insert_account")?;
        data.accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(())
    }

    async fn register_student(
        &self,
        student: &Student,
        account: &Account,
    ) -> RepositoryResult<()> {
        self.check_health("register_student")?;
        let mut data = self.data.write();
        data.check_student_free(student, "register_student")?;
        data.check_account_free(account, "register_student")?;
        data.students
            .insert(student.student_id.clone(), student.clone());
        data.accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(())
    }

    async fn register_instructor(
        &self,
        instructor: &Instructor,
        account: &Account,
    ) -> RepositoryResult<()> {
        self.check_health("register_instructor")?;
        let mut data = self.data.write();
        data.check_instructor_free(instructor, "register_instructor")?;
        data.check_account_free(account, "register_instructor")?;
        data.instructors
            .insert(instructor.instructor_id.clone(), instructor.clone());
        data.accounts
            .insert(account.user_id.clone(), account.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CourseDetails, CourseKey, Schedule};

    fn course(id: &str, room: &str, days: &[&str], start: &str, end: &str) -> Course {
        Course {
            c_id: CourseKey::generate(),
            course_id: CourseId::from(id),
            details: CourseDetails {
                course_name: format!("Course {}", id),
                section: None,
                schedule: Schedule::parse(days.iter().copied(), start, end).unwrap(),
                room: RoomId::from(room),
                instructor_name: "Dr. Test".to_string(),
                instructor_id: None,
                registered_students_count: 0,
            },
        }
    }

    #[tokio::test]
    async fn test_health_toggle() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());
        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let err = repo.list_rooms().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_rooms_are_listed_in_identifier_order() {
        let repo = LocalRepository::new();
        repo.insert_room(&Room::new("R3", 10)).await.unwrap();
        repo.insert_room(&Room::new("R1", 10)).await.unwrap();
        repo.insert_room(&Room::new("R2", 10)).await.unwrap();

        let ids: Vec<String> = repo
            .list_rooms()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.room.0)
            .collect();
        assert_eq!(ids, vec!["R1", "R2", "R3"]);

        let dup = repo.insert_room(&Room::new("R1", 5)).await.unwrap_err();
        assert!(dup.is_conflict());
    }

    #[tokio::test]
    async fn test_insert_course_rejects_duplicate_id() {
        let repo = LocalRepository::new();
        repo.insert_course(&course("CS101", "R1", &["Mon"], "09:00", "10:00"))
            .await
            .unwrap();
        let err = repo
            .insert_course(&course("CS101", "R2", &["Tue"], "09:00", "10:00"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.course_count(), 1);
    }

    #[tokio::test]
    async fn test_courses_meeting_on_uses_any_shared_day() {
        let repo = LocalRepository::new();
        repo.seed_course(course("A", "R1", &["Mon"], "09:00", "10:00"));
        repo.seed_course(course("B", "R1", &["Tue", "Thu"], "09:00", "10:00"));
        repo.seed_course(course("C", "R1", &["Wed", "Fri"], "09:00", "10:00"));

        let days: BTreeSet<Weekday> = [Weekday::Monday, Weekday::Wednesday].into_iter().collect();
        let ids: Vec<String> = repo
            .courses_meeting_on(&days)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.course_id.0)
            .collect();
        assert_eq!(ids, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_commit_enrollment_checks_pair_and_capacity() {
        let repo = LocalRepository::new();
        repo.seed_course(course("C1", "R1", &["Mon"], "09:00", "10:00"));

        let first = Enrollment::new("S1".into(), "C1".into());
        assert_eq!(
            repo.commit_enrollment(&first, Some(1)).await.unwrap(),
            EnrollmentCommit::Committed {
                registered_students_count: 1
            }
        );

        let again = Enrollment::new("S1".into(), "C1".into());
        assert_eq!(
            repo.commit_enrollment(&again, Some(5)).await.unwrap(),
            EnrollmentCommit::AlreadyEnrolled
        );

        let second = Enrollment::new("S2".into(), "C1".into());
        assert_eq!(
            repo.commit_enrollment(&second, Some(1)).await.unwrap(),
            EnrollmentCommit::CapacityReached { capacity: 1 }
        );

        assert_eq!(repo.registered_count("C1"), Some(1));
        assert_eq!(repo.enrollment_count(), 1);
    }

    #[tokio::test]
    async fn test_commit_enrollment_rejects_overlapping_course() {
        let repo = LocalRepository::new();
        repo.seed_course(course("C1", "R1", &["Mon"], "09:00", "10:00"));
        repo.seed_course(course("C2", "R2", &["Mon", "Wed"], "09:30", "10:30"));
        repo.seed_course(course("C3", "R2", &["Mon"], "10:00", "11:00"));

        let first = Enrollment::new("S1".into(), "C1".into());
        repo.commit_enrollment(&first, None).await.unwrap();

        let overlapping = Enrollment::new("S1".into(), "C2".into());
        assert_eq!(
            repo.commit_enrollment(&overlapping, None).await.unwrap(),
            EnrollmentCommit::ScheduleConflict {
                conflicting: "C1".into()
            }
        );
        assert_eq!(repo.registered_count("C2"), Some(0));

        let adjacent = Enrollment::new("S1".into(), "C3".into());
        assert!(matches!(
            repo.commit_enrollment(&adjacent, None).await.unwrap(),
            EnrollmentCommit::Committed { .. }
        ));
    }

    #[tokio::test]
    async fn test_commit_enrollment_unbounded_and_missing_course() {
        let repo = LocalRepository::new();
        repo.seed_course(course("C1", "R1", &["Mon"], "09:00", "10:00"));
        for i in 0..50 {
            let e = Enrollment::new(StudentId::new(format!("S{}", i)), "C1".into());
            assert!(matches!(
                repo.commit_enrollment(&e, None).await.unwrap(),
                EnrollmentCommit::Committed { .. }
            ));
        }
        assert_eq!(repo.registered_count("C1"), Some(50));

        let orphan = Enrollment::new("S1".into(), "NOPE".into());
        assert_eq!(
            repo.commit_enrollment(&orphan, None).await.unwrap(),
            EnrollmentCommit::CourseMissing
        );
    }

    #[tokio::test]
    async fn test_register_student_is_all_or_nothing() {
        let repo = LocalRepository::new();
        let account = Account {
            u_id: crate::models::AccountKey::generate(),
            user_id: UserId::from("S1"),
            role: crate::models::Role::Student,
            credential_ref: None,
        };
        repo.insert_account(&account).await.unwrap();

        let student = Student {
            s_id: StudentKey::generate(),
            student_id: StudentId::from("S1"),
            full_name: "Ada".to_string(),
        };
        let err = repo.register_student(&student, &account).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.student_count(), 0);
        assert_eq!(repo.account_count(), 1);
    }

    #[tokio::test]
    async fn test_clear_keeps_health_flag() {
        let repo = LocalRepository::new();
        repo.seed_room(Room::new("R1", 3)).unwrap();
        repo.set_healthy(false);
        repo.clear();
        assert_eq!(repo.room_count(), 0);
        assert!(!repo.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_capacity_room_is_rejected() {
        let repo = LocalRepository::new();
        let empty = Room {
            room: RoomId::from("R0"),
            capacity: Some(0),
        };

        let err = repo.insert_room(&empty).await.unwrap_err();
        assert!(err.is_validation());
        assert!(repo.seed_room(empty).unwrap_err().is_validation());
        assert_eq!(repo.room_count(), 0);

        let unspecified = Room {
            room: RoomId::from("R9"),
            capacity: None,
        };
        repo.insert_room(&unspecified).await.unwrap();
        assert_eq!(repo.room_count(), 1);
    }
}
