//! Integration tests for the enrollment admission controller.

mod support;

use support::{campus, course, schedule};
use university_portal::db::{CatalogRepository, EnrollmentRepository, LocalRepository};
use university_portal::models::{CourseId, Room, RoomId, StudentId};
use university_portal::services::{
    enroll, has_time_conflict, ErrorKind, PortalError, PortalOptions,
};

fn sid(id: &str) -> StudentId {
    StudentId::from(id)
}

fn cid(id: &str) -> CourseId {
    CourseId::from(id)
}

/// Campus with C1 in the two-seat room R1.
fn small_course() -> LocalRepository {
    let repo = campus();
    repo.seed_course(course(
        "C1",
        "R1",
        Some(("I1", "Dr. A")),
        schedule(&["Monday"], "09:00", "10:00"),
    ));
    repo
}

#[tokio::test]
async fn test_admission_until_capacity() {
    let repo = small_course();
    let options = PortalOptions::default();

    let first = enroll(&repo, &sid("S1"), &cid("C1"), &options)
        .await
        .unwrap();
    assert_eq!(first.registered_students_count, 1);
    assert!(first.e_id.as_str().starts_with("enrollment_"));

    let again = enroll(&repo, &sid("S1"), &cid("C1"), &options)
        .await
        .unwrap_err();
    assert_eq!(again.kind(), ErrorKind::AlreadyEnrolled);

    let second = enroll(&repo, &sid("S2"), &cid("C1"), &options)
        .await
        .unwrap();
    assert_eq!(second.registered_students_count, 2);

    match enroll(&repo, &sid("S3"), &cid("C1"), &options).await {
        Err(PortalError::CourseFull { capacity, .. }) => assert_eq!(capacity, 2),
        other => panic!("unexpected: {:?}", other),
    }

    assert_eq!(repo.registered_count("C1"), Some(2));
    assert_eq!(repo.enrollment_count(), 2);
}

#[tokio::test]
async fn test_unknown_student_and_course() {
    let repo = small_course();
    let options = PortalOptions::default();

    let err = enroll(&repo, &sid("S404"), &cid("C1"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StudentNotFound);

    let err = enroll(&repo, &sid("S1"), &cid("C404"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CourseNotFound);
    assert_eq!(repo.enrollment_count(), 0);
}

#[tokio::test]
async fn test_student_checked_before_course() {
    let repo = small_course();
    let err = enroll(&repo, &sid("S404"), &cid("C404"), &PortalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StudentNotFound);
}

#[tokio::test]
async fn test_time_conflict_blocks_overlap_only() {
    let repo = campus();
    repo.seed_course(course(
        "C1",
        "R2",
        Some(("I1", "Dr. A")),
        schedule(&["Monday"], "09:00", "10:00"),
    ));
    repo.seed_course(course(
        "C2",
        "R3",
        Some(("I2", "Dr. B")),
        schedule(&["Monday"], "09:30", "10:30"),
    ));
    repo.seed_course(course(
        "C3",
        "R3",
        Some(("I2", "Dr. B")),
        schedule(&["Monday"], "10:00", "11:00"),
    ));
    let options = PortalOptions::default();

    enroll(&repo, &sid("S1"), &cid("C1"), &options)
        .await
        .unwrap();

    match enroll(&repo, &sid("S1"), &cid("C2"), &options).await {
        Err(PortalError::ScheduleConflict { conflicting, .. }) => {
            assert_eq!(conflicting, cid("C1"))
        }
        other => panic!("unexpected: {:?}", other),
    }

    enroll(&repo, &sid("S1"), &cid("C3"), &options)
        .await
        .unwrap();
    assert_eq!(repo.registered_count("C2"), Some(0));
}

#[tokio::test]
async fn test_has_time_conflict_ignores_target_course() {
    let repo = small_course();
    enroll(&repo, &sid("S1"), &cid("C1"), &PortalOptions::default())
        .await
        .unwrap();

    let c1 = university_portal::db::CourseRepository::find_course(&repo, &cid("C1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(has_time_conflict(&repo, &sid("S1"), &c1).await.unwrap(), None);
}

#[tokio::test]
async fn test_room_without_capacity_uses_default() {
    let repo = campus();
    repo.seed_course(course(
        "C1",
        "R3",
        Some(("I1", "Dr. A")),
        schedule(&["Monday"], "09:00", "10:00"),
    ));
    let options = PortalOptions::default().with_default_room_capacity(1);

    enroll(&repo, &sid("S1"), &cid("C1"), &options)
        .await
        .unwrap();
    let err = enroll(&repo, &sid("S2"), &cid("C1"), &options)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CourseFull);
}

#[tokio::test]
async fn test_course_in_unknown_room_is_unbounded() {
    let repo = campus();
    repo.seed_course(course(
        "C1",
        "Annex",
        Some(("I1", "Dr. A")),
        schedule(&["Monday"], "09:00", "10:00"),
    ));
    let options = PortalOptions::default().with_default_room_capacity(1);

    for student in ["S1", "S2", "S3"] {
        enroll(&repo, &sid(student), &cid("C1"), &options)
            .await
            .unwrap();
    }
    assert_eq!(repo.registered_count("C1"), Some(3));
}

#[tokio::test]
async fn test_new_enrollment_is_ungraded() {
    let repo = small_course();
    enroll(&repo, &sid("S1"), &cid("C1"), &PortalOptions::default())
        .await
        .unwrap();

    let stored = repo
        .find_enrollment(&sid("S1"), &cid("C1"))
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.grade.is_graded());
}

#[tokio::test]
async fn test_store_outage_is_retryable() {
    let repo = small_course();
    repo.set_healthy(false);

    let err = enroll(&repo, &sid("S1"), &cid("C1"), &PortalOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert!(err.is_retryable());

    repo.set_healthy(true);
    assert_eq!(repo.enrollment_count(), 0);
    assert_eq!(repo.registered_count("C1"), Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_never_overfill() {
    let repo = small_course();
    let students: Vec<String> = (0..8).map(|n| format!("X{}", n)).collect();
    for id in &students {
        repo.seed_student(id, "Racer");
    }

    let mut handles = Vec::new();
    for id in students {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            enroll(&repo, &StudentId::from(id), &cid("C1"), &PortalOptions::default()).await
        }));
    }

    let mut admitted = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(PortalError::CourseFull { .. }) => full += 1,
            Err(other) => panic!("unexpected: {:?}", other),
        }
    }

    assert_eq!(admitted, 2);
    assert_eq!(full, 6);
    assert_eq!(repo.registered_count("C1"), Some(2));
    assert_eq!(repo.enrollment_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicates_admit_once() {
    let repo = campus();
    repo.seed_course(course(
        "C1",
        "R2",
        Some(("I1", "Dr. A")),
        schedule(&["Monday"], "09:00", "10:00"),
    ));

    let mut handles = Vec::new();
    for _ in 0..6 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            enroll(&repo, &sid("S1"), &cid("C1"), &PortalOptions::default()).await
        }));
    }

    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(err) => assert_eq!(err.kind(), ErrorKind::AlreadyEnrolled),
        }
    }

    assert_eq!(admitted, 1);
    assert_eq!(repo.registered_count("C1"), Some(1));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overlapping_courses_admit_one() {
    for _ in 0..20 {
        let repo = campus();
        for (id, start, end) in [("C1", "09:00", "10:00"), ("C2", "09:30", "10:30")] {
            repo.seed_course(course(
                id,
                "R2",
                Some(("I1", "Dr. A")),
                schedule(&["Monday"], start, end),
            ));
        }

        let mut handles = Vec::new();
        for target in ["C1", "C2"] {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                enroll(&repo, &sid("S1"), &cid(target), &PortalOptions::default()).await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => admitted += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::ScheduleConflict),
            }
        }
        assert_eq!(admitted, 1);
        assert_eq!(repo.enrollment_count(), 1);
    }
}

#[tokio::test]
async fn test_zero_capacity_room_cannot_be_seeded() {
    let repo = campus();
    let err = repo
        .seed_room(Room {
            room: RoomId::from("R0"),
            capacity: Some(0),
        })
        .unwrap_err();
    assert!(err.is_validation());

    let err = repo
        .insert_room(&Room {
            room: RoomId::from("R0"),
            capacity: Some(0),
        })
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert_eq!(repo.room_count(), 3);
}
