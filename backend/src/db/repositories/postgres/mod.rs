//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database
//! using the schema created by the embedded migrations.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//! - Admission commits as a single transaction with a conditional counter update
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::db::repository::{
    CatalogRepository, CourseRepository, EnrollmentCommit, EnrollmentRepository, ErrorContext,
    RegistrationRepository, RepositoryError, RepositoryResult,
};
use crate::models::{
    Account, Course, CourseDetails, CourseId, Enrollment, Grade, Instructor, InstructorId, Role,
    Room, RoomId, Schedule, Student, StudentId, TimeOfDay, UserId, Weekday,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    pub connections_in_use: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub max_size: u32,
    pub total_queries: u64,
    pub failed_queries: u64,
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The closure runs on the blocking pool and is replayed from the top (up
    /// to `max_retries` times) when it fails with a retryable error, so
    /// anything it does must be wrapped in a transaction.
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1)),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn corrupt(entity: &str, id: &str, details: impl Into<String>) -> RepositoryError {
    RepositoryError::internal_with_context(
        format!("Stored {} is malformed", entity),
        ErrorContext::new("decode_row")
            .with_entity(entity)
            .with_entity_id(id)
            .with_details(details),
    )
}

fn to_db_count(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn from_db_count(entity: &str, id: &str, value: i32) -> RepositoryResult<u32> {
    u32::try_from(value).map_err(|_| corrupt(entity, id, format!("negative count {}", value)))
}

/// First course (by id) held by `student_id` that overlaps `course_id` in time.
fn first_conflict(
    conn: &mut PgConnection,
    student_id: &str,
    course_id: &str,
) -> RepositoryResult<Option<CourseId>> {
    let Some(target) = courses::table
        .filter(courses::course_id.eq(course_id))
        .select(CourseRow::as_select())
        .first::<CourseRow>(conn)
        .optional()
        .map_err(map_diesel_error)?
    else {
        return Ok(None);
    };

    let held: Vec<String> = enrollments::table
        .filter(enrollments::student_id.eq(student_id))
        .filter(enrollments::course_id.ne(course_id))
        .select(enrollments::course_id)
        .load(conn)
        .map_err(map_diesel_error)?;
    if held.is_empty() {
        return Ok(None);
    }

    let candidates = courses::table
        .filter(courses::course_id.eq_any(&held))
        .filter(courses::days.overlaps_with(&target.days))
        .order(courses::course_id.asc())
        .select(CourseRow::as_select())
        .load::<CourseRow>(conn)
        .map_err(map_diesel_error)?;

    let target = row_to_course(target)?;
    for row in candidates {
        let course = row_to_course(row)?;
        if course.schedule().conflicts_with(target.schedule()) {
            return Ok(Some(course.course_id));
        }
    }
    Ok(None)
}

fn row_to_room(row: RoomRow) -> RepositoryResult<Room> {
    let capacity = row
        .capacity
        .map(|c| from_db_count("room", &row.room, c))
        .transpose()?;
    Ok(Room {
        room: RoomId(row.room),
        capacity,
    })
}

fn row_to_instructor(row: InstructorRow) -> Instructor {
    Instructor {
        i_id: row.i_id.into(),
        instructor_id: row.instructor_id.into(),
        full_name: row.full_name,
    }
}

fn row_to_student(row: StudentRow) -> Student {
    Student {
        s_id: row.s_id.into(),
        student_id: row.student_id.into(),
        full_name: row.full_name,
    }
}

fn course_to_row(course: &Course) -> CourseRow {
    let details = &course.details;
    CourseRow {
        c_id: course.c_id.0.clone(),
        course_id: course.course_id.0.clone(),
        course_name: details.course_name.clone(),
        section: details.section.clone(),
        days: details.schedule.day_labels(),
        start_time: details.schedule.start_time().as_naive_time(),
        end_time: details.schedule.end_time().as_naive_time(),
        room: details.room.0.clone(),
        instructor_name: details.instructor_name.clone(),
        instructor_id: details.instructor_id.as_ref().map(|i| i.0.clone()),
        registered_students_count: to_db_count(details.registered_students_count),
    }
}

fn row_to_course(row: CourseRow) -> RepositoryResult<Course> {
    let days = row
        .days
        .iter()
        .map(|d| Weekday::from_str(d))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| corrupt("course", &row.course_id, e.to_string()))?;
    let schedule = Schedule::new(
        days,
        TimeOfDay::from(row.start_time),
        TimeOfDay::from(row.end_time),
    )
    .map_err(|e| corrupt("course", &row.course_id, e.to_string()))?;
    let registered_students_count =
        from_db_count("course", &row.course_id, row.registered_students_count)?;

    Ok(Course {
        c_id: row.c_id.into(),
        course_id: row.course_id.into(),
        details: CourseDetails {
            course_name: row.course_name,
            section: row.section,
            schedule,
            room: row.room.into(),
            instructor_name: row.instructor_name,
            instructor_id: row.instructor_id.map(InstructorId),
            registered_students_count,
        },
    })
}

fn row_to_enrollment(row: EnrollmentRow) -> Enrollment {
    Enrollment {
        e_id: row.e_id.into(),
        student_id: row.student_id.into(),
        course_id: row.course_id.into(),
        grade: Grade(row.grade),
    }
}

fn row_to_account(row: AccountRow) -> RepositoryResult<Account> {
    let role = Role::from_str(&row.role).map_err(|e| corrupt("account", &row.user_id, e))?;
    Ok(Account {
        u_id: row.u_id.into(),
        user_id: row.user_id.into(),
        role,
        credential_ref: row.credential_ref,
    })
}

fn account_to_row(account: &Account) -> AccountRow {
    AccountRow {
        u_id: account.u_id.0.clone(),
        user_id: account.user_id.0.clone(),
        role: account.role.as_str().to_string(),
        credential_ref: account.credential_ref.clone(),
    }
}

fn instructor_to_row(instructor: &Instructor) -> InstructorRow {
    InstructorRow {
        i_id: instructor.i_id.0.clone(),
        instructor_id: instructor.instructor_id.0.clone(),
        full_name: instructor.full_name.clone(),
    }
}

fn student_to_row(student: &Student) -> StudentRow {
    StudentRow {
        s_id: student.s_id.0.clone(),
        student_id: student.student_id.0.clone(),
        full_name: student.full_name.clone(),
    }
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn insert_room(&self, room: &Room) -> RepositoryResult<()> {
        room.validate().map_err(|message| {
            RepositoryError::validation(message).with_operation("insert_room")
        })?;
        let row = RoomRow {
            room: room.room.0.clone(),
            capacity: room.capacity.map(to_db_count),
        };
        self.with_conn(move |conn| {
            diesel::insert_into(rooms::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| map_diesel_error(e).with_operation("insert_room"))
        })
        .await
    }

    async fn find_room(&self, room: &RoomId) -> RepositoryResult<Option<Room>> {
        let room = room.0.clone();
        self.with_conn(move |conn| {
            rooms::table
                .filter(rooms::room.eq(&room))
                .select(RoomRow::as_select())
                .first::<RoomRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_room)
                .transpose()
        })
        .await
    }

    async fn list_rooms(&self) -> RepositoryResult<Vec<Room>> {
        self.with_conn(|conn| {
            rooms::table
                .order(rooms::room.asc())
                .select(RoomRow::as_select())
                .load::<RoomRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_room)
                .collect()
        })
        .await
    }

    async fn find_instructor(
        &self,
        instructor_id: &InstructorId,
    ) -> RepositoryResult<Option<Instructor>> {
        let instructor_id = instructor_id.0.clone();
        self.with_conn(move |conn| {
            Ok(instructors::table
                .filter(instructors::instructor_id.eq(&instructor_id))
                .select(InstructorRow::as_select())
                .first::<InstructorRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_instructor))
        })
        .await
    }

    async fn list_instructors(&self) -> RepositoryResult<Vec<Instructor>> {
        self.with_conn(|conn| {
            Ok(instructors::table
                .order(instructors::instructor_id.asc())
                .select(InstructorRow::as_select())
                .load::<InstructorRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_instructor)
                .collect())
        })
        .await
    }

    async fn find_student(&self, student_id: &StudentId) -> RepositoryResult<Option<Student>> {
        let student_id = student_id.0.clone();
        self.with_conn(move |conn| {
            Ok(students::table
                .filter(students::student_id.eq(&student_id))
                .select(StudentRow::as_select())
                .first::<StudentRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_student))
        })
        .await
    }
}

#[async_trait]
impl CourseRepository for PostgresRepository {
    async fn insert_course(&self, course: &Course) -> RepositoryResult<()> {
        let row = course_to_row(course);
        self.with_conn(move |conn| {
            diesel::insert_into(courses::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| map_diesel_error(e).with_operation("insert_course"))
        })
        .await
    }

    async fn find_course(&self, course_id: &CourseId) -> RepositoryResult<Option<Course>> {
        let course_id = course_id.0.clone();
        self.with_conn(move |conn| {
            courses::table
                .filter(courses::course_id.eq(&course_id))
                .select(CourseRow::as_select())
                .first::<CourseRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_course)
                .transpose()
        })
        .await
    }

    async fn list_courses(&self) -> RepositoryResult<Vec<Course>> {
        self.with_conn(|conn| {
            courses::table
                .order(courses::course_id.asc())
                .select(CourseRow::as_select())
                .load::<CourseRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_course)
                .collect()
        })
        .await
    }

    async fn courses_by_ids(&self, course_ids: &[CourseId]) -> RepositoryResult<Vec<Course>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = course_ids.iter().map(|c| c.0.clone()).collect();
        self.with_conn(move |conn| {
            courses::table
                .filter(courses::course_id.eq_any(&ids))
                .order(courses::course_id.asc())
                .select(CourseRow::as_select())
                .load::<CourseRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_course)
                .collect()
        })
        .await
    }

    async fn courses_meeting_on(&self, days: &BTreeSet<Weekday>) -> RepositoryResult<Vec<Course>> {
        if days.is_empty() {
            return Ok(Vec::new());
        }
        let labels: Vec<String> = days.iter().map(|d| d.as_str().to_string()).collect();
        self.with_conn(move |conn| {
            courses::table
                .filter(courses::days.overlaps_with(&labels))
                .order(courses::course_id.asc())
                .select(CourseRow::as_select())
                .load::<CourseRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_course)
                .collect()
        })
        .await
    }
}

#[async_trait]
impl EnrollmentRepository for PostgresRepository {
    async fn find_enrollment(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> RepositoryResult<Option<Enrollment>> {
        let student_id = student_id.0.clone();
        let course_id = course_id.0.clone();
        self.with_conn(move |conn| {
            Ok(enrollments::table
                .filter(enrollments::student_id.eq(&student_id))
                .filter(enrollments::course_id.eq(&course_id))
                .select(EnrollmentRow::as_select())
                .first::<EnrollmentRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_enrollment))
        })
        .await
    }

    async fn enrollments_for_student(
        &self,
        student_id: &StudentId,
    ) -> RepositoryResult<Vec<Enrollment>> {
        let student_id = student_id.0.clone();
        self.with_conn(move |conn| {
            Ok(enrollments::table
                .filter(enrollments::student_id.eq(&student_id))
                .order(enrollments::course_id.asc())
                .select(EnrollmentRow::as_select())
                .load::<EnrollmentRow>(conn)
                .map_err(map_diesel_error)?
                .into_iter()
                .map(row_to_enrollment)
                .collect())
        })
        .await
    }

    async fn commit_enrollment(
        &self,
        enrollment: &Enrollment,
        capacity: Option<u32>,
    ) -> RepositoryResult<EnrollmentCommit> {
        let row = EnrollmentRow {
            e_id: enrollment.e_id.0.clone(),
            student_id: enrollment.student_id.0.clone(),
            course_id: enrollment.course_id.0.clone(),
            grade: enrollment.grade.0.clone(),
        };
        let limit = capacity.map(to_db_count).unwrap_or(i32::MAX);

        let outcome = self
            .with_conn(move |conn| {
                conn.transaction(|tx| {
                    // Serializes admissions of the same student across courses.
                    students::table
                        .filter(students::student_id.eq(&row.student_id))
                        .select(students::student_id)
                        .for_update()
                        .first::<String>(tx)
                        .optional()
                        .map_err(map_diesel_error)?;

                    let existing = enrollments::table
                        .filter(enrollments::student_id.eq(&row.student_id))
                        .filter(enrollments::course_id.eq(&row.course_id))
                        .count()
                        .get_result::<i64>(tx)
                        .map_err(map_diesel_error)?;
                    if existing > 0 {
                        return Ok(EnrollmentCommit::AlreadyEnrolled);
                    }

                    if let Some(conflicting) =
                        first_conflict(tx, &row.student_id, &row.course_id)?
                    {
                        return Ok(EnrollmentCommit::ScheduleConflict { conflicting });
                    }

                    // The row lock taken here serializes admissions per course.
                    let updated = diesel::update(
                        courses::table
                            .filter(courses::course_id.eq(&row.course_id))
                            .filter(courses::registered_students_count.lt(limit)),
                    )
                    .set(
                        courses::registered_students_count
                            .eq(courses::registered_students_count + 1),
                    )
                    .returning(courses::registered_students_count)
                    .get_result::<i32>(tx)
                    .optional()
                    .map_err(map_diesel_error)?;

                    let Some(count) = updated else {
                        let exists = courses::table
                            .filter(courses::course_id.eq(&row.course_id))
                            .count()
                            .get_result::<i64>(tx)
                            .map_err(map_diesel_error)?;
                        return Ok(if exists == 0 {
                            EnrollmentCommit::CourseMissing
                        } else {
                            EnrollmentCommit::CapacityReached {
                                capacity: capacity.unwrap_or(u32::MAX),
                            }
                        });
                    };

                    let inserted = diesel::insert_into(enrollments::table)
                        .values(&row)
                        .on_conflict((enrollments::student_id, enrollments::course_id))
                        .do_nothing()
                        .execute(tx)
                        .map_err(map_diesel_error)?;
                    if inserted == 0 {
                        // Lost a race on the same pair; undo the increment.
                        return Err(RepositoryError::conflict_with_context(
                            "enrollment already exists",
                            ErrorContext::new("commit_enrollment")
                                .with_entity("enrollment")
                                .with_entity_id(format!("{}/{}", row.student_id, row.course_id)),
                        ));
                    }

                    Ok(EnrollmentCommit::Committed {
                        registered_students_count: from_db_count(
                            "course",
                            &row.course_id,
                            count,
                        )?,
                    })
                })
            })
            .await;

        match outcome {
            Err(e) if e.is_conflict() => Ok(EnrollmentCommit::AlreadyEnrolled),
            other => other,
        }
    }
}

#[async_trait]
impl RegistrationRepository for PostgresRepository {
    async fn insert_student(&self, student: &Student) -> RepositoryResult<()> {
        let row = student_to_row(student);
        self.with_conn(move |conn| {
            diesel::insert_into(students::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| map_diesel_error(e).with_operation("insert_student"))
        })
        .await
    }

    async fn insert_instructor(&self, instructor: &Instructor) -> RepositoryResult<()> {
        let row = instructor_to_row(instructor);
        self.with_conn(move |conn| {
            diesel::insert_into(instructors::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| map_diesel_error(e).with_operation("insert_instructor"))
        })
        .await
    }

    async fn find_account(&self, user_id: &UserId) -> RepositoryResult<Option<Account>> {
        let user_id = user_id.0.clone();
        self.with_conn(move |conn| {
            accounts::table
                .filter(accounts::user_id.eq(&user_id))
                .select(AccountRow::as_select())
                .first::<AccountRow>(conn)
                .optional()
                .map_err(map_diesel_error)?
                .map(row_to_account)
                .transpose()
        })
        .await
    }

    async fn insert_account(&self, account: &Account) -> RepositoryResult<()> {
        let row = account_to_row(account);
        self.with_conn(move |conn| {
            diesel::insert_into(accounts::table)
                .values(&row)
                .execute(conn)
                .map(|_| ())
                .map_err(|e| map_diesel_error(e).with_operation("insert_account"))
        })
        .await
    }

    async fn register_student(
        &self,
        student: &Student,
        account: &Account,
    ) -> RepositoryResult<()> {
        let student = student_to_row(student);
        let account = account_to_row(account);
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                diesel::insert_into(students::table)
                    .values(&student)
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                diesel::insert_into(accounts::table)
                    .values(&account)
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
        .map_err(|e| e.with_operation("register_student"))
    }

    async fn register_instructor(
        &self,
        instructor: &Instructor,
        account: &Account,
    ) -> RepositoryResult<()> {
        let instructor = instructor_to_row(instructor);
        let account = account_to_row(account);
        self.with_conn(move |conn| {
            conn.transaction(|tx| {
                diesel::insert_into(instructors::table)
                    .values(&instructor)
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                diesel::insert_into(accounts::table)
                    .values(&account)
                    .execute(tx)
                    .map_err(map_diesel_error)?;
                Ok(())
            })
        })
        .await
        .map_err(|e| e.with_operation("register_instructor"))
    }
}
