//! Portal seeding binary.
//!
//! Loads a JSON seed catalog and applies it through the service layer, so
//! every record passes the same gates as an interactive request. Each
//! outcome is printed as one JSON line on stdout.
//!
//! # Usage
//!
//! ```bash
//! # Dry run against the in-memory store (validates the seed)
//! cargo run --bin portal-seed -- demos/seed.json
//!
//! # Load into PostgreSQL using repository.toml
//! cargo run --bin portal-seed --features postgres-repo -- demos/seed.json --config repository.toml
//! ```
//!
//! # Environment Variables
//!
//! - `REPOSITORY_TYPE`, `DATABASE_URL`, `PG_*`: store selection when no `--config` is given
//! - `RUST_LOG`: Log level (default: info)

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use university_portal::api::ActionOutcome;
use university_portal::db::{FullRepository, RepositoryConfig, RepositoryFactory};
use university_portal::models::{CourseId, Room, StudentId};
use university_portal::services::{
    self, AccountRequest, CourseRequest, InstructorRequest, PortalOptions, StudentRequest,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedFile {
    rooms: Vec<Room>,
    instructors: Vec<InstructorRequest>,
    students: Vec<StudentRequest>,
    accounts: Vec<AccountRequest>,
    courses: Vec<CourseRequest>,
    enrollments: Vec<SeedEnrollment>,
}

#[derive(Debug, Deserialize)]
struct SeedEnrollment {
    student_id: String,
    course_id: String,
}

struct Args {
    seed_path: PathBuf,
    config_path: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut seed_path = None;
    let mut config_path = None;
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = args.next().context("--config requires a path")?;
                config_path = Some(PathBuf::from(path));
            }
            other if seed_path.is_none() => seed_path = Some(PathBuf::from(other)),
            other => bail!("unexpected argument '{}'", other),
        }
    }
    Ok(Args {
        seed_path: seed_path.context("usage: portal-seed <seed.json> [--config repository.toml]")?,
        config_path,
    })
}

#[derive(Default)]
struct Tally {
    applied: usize,
    rejected: usize,
}

impl Tally {
    fn record(&mut self, section: &str, outcome: ActionOutcome) -> Result<()> {
        if outcome.success {
            self.applied += 1;
        } else {
            self.rejected += 1;
            warn!(
                "{}: {}",
                section,
                outcome.error.as_deref().unwrap_or("rejected")
            );
            if outcome.retryable {
                bail!("store unavailable while seeding {}", section);
            }
        }
        let mut line = outcome.to_json();
        line["section"] = serde_json::Value::from(section);
        println!("{}", line);
        Ok(())
    }
}

async fn apply_seed(
    repo: &dyn FullRepository,
    seed: &SeedFile,
    options: &PortalOptions,
) -> Result<Tally> {
    let mut tally = Tally::default();

    for room in &seed.rooms {
        let outcome = match repo.insert_room(room).await {
            Ok(()) => ActionOutcome::ok("Room Created!").with_id("room", &room.room),
            Err(e) if e.is_conflict() => {
                ActionOutcome::from(services::PortalError::DuplicateEntity {
                    entity: "Room",
                    id: room.room.to_string(),
                })
            }
            Err(e) if e.is_validation() => ActionOutcome::from(services::PortalError::InvalidField {
                field: "capacity".to_string(),
                reason: e.to_string(),
            }),
            Err(e) => return Err(e).context("failed to insert room"),
        };
        tally.record("rooms", outcome)?;
    }

    for request in &seed.instructors {
        let result = services::create_instructor(repo, request).await;
        tally.record("instructors", ActionOutcome::from_result(result))?;
    }

    for request in &seed.students {
        let result = services::create_student(repo, request).await;
        tally.record("students", ActionOutcome::from_result(result))?;
    }

    for request in &seed.accounts {
        let result = services::create_account(repo, request).await;
        tally.record("accounts", ActionOutcome::from_result(result))?;
    }

    for request in &seed.courses {
        let result = services::create_course(repo, request, options).await;
        tally.record("courses", ActionOutcome::from_result(result))?;
    }

    for enrollment in &seed.enrollments {
        let result = services::enroll(
            repo,
            &StudentId::from(enrollment.student_id.as_str()),
            &CourseId::from(enrollment.course_id.as_str()),
            options,
        )
        .await;
        tally.record("enrollments", ActionOutcome::from_result(result))?;
    }

    Ok(tally)
}

async fn open_store(args: &Args) -> Result<(Arc<dyn FullRepository>, PortalOptions)> {
    match &args.config_path {
        Some(path) => {
            let config = RepositoryConfig::from_file(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            let repo = RepositoryFactory::from_repository_config(&config).await?;
            Ok((repo, config.portal_options()))
        }
        None => Ok((RepositoryFactory::from_env().await?, PortalOptions::default())),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let content = std::fs::read_to_string(&args.seed_path)
        .with_context(|| format!("failed to read {}", args.seed_path.display()))?;
    let seed: SeedFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", args.seed_path.display()))?;

    let (repo, options) = open_store(&args).await?;
    if !repo.health_check().await? {
        bail!("store failed its health check");
    }
    info!(
        "Seeding {} room(s), {} course(s), {} enrollment(s)",
        seed.rooms.len(),
        seed.courses.len(),
        seed.enrollments.len()
    );

    let tally = apply_seed(repo.as_ref(), &seed, &options).await?;
    info!(
        "Seeding finished: {} applied, {} rejected",
        tally.applied, tally.rejected
    );
    Ok(())
}
