//! Student, instructor and account registration.
//!
//! `register_student` and `register_instructor` persist the profile and its
//! login account through one atomic repository call, so a failed account
//! write never leaves an orphan profile behind.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::{PortalError, PortalResult};
use crate::db::repository::{FullRepository, RepositoryError};
use crate::models::{
    Account, AccountKey, Instructor, InstructorId, InstructorKey, Role, Student, StudentId,
    StudentKey, UserId,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRequest {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstructorRequest {
    #[serde(default)]
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Login account request. `credential_ref` is the opaque handle returned by
/// the external credential service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub credential_ref: Option<String>,
}

/// Keys of a profile registered together with its account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub profile_key: String,
    pub user_id: UserId,
    pub role: Role,
}

fn required(value: &Option<String>, field: &str) -> PortalResult<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(PortalError::missing(field)),
    }
}

impl StudentRequest {
    fn to_student(&self) -> PortalResult<Student> {
        Ok(Student {
            s_id: StudentKey::generate(),
            student_id: StudentId::new(required(&self.student_id, "student_id")?),
            full_name: required(&self.full_name, "full_name")?,
        })
    }
}

impl InstructorRequest {
    fn to_instructor(&self) -> PortalResult<Instructor> {
        Ok(Instructor {
            i_id: InstructorKey::generate(),
            instructor_id: InstructorId::new(required(&self.instructor_id, "instructor_id")?),
            full_name: required(&self.full_name, "full_name")?,
        })
    }
}

impl AccountRequest {
    fn to_account(&self) -> PortalResult<Account> {
        let user_id = required(&self.user_id, "user_id")?;
        let role = required(&self.role, "role")?;
        let role = Role::from_str(&role).map_err(|e| PortalError::invalid("role", e))?;
        Ok(Account {
            u_id: AccountKey::generate(),
            user_id: UserId::new(user_id),
            role,
            credential_ref: self.credential_ref.clone(),
        })
    }

    /// Account bound to a profile created in the same call.
    ///
    /// The user id and role always follow the profile.
    fn bound_to(&self, user_id: &str, role: Role) -> Account {
        if self.user_id.as_deref().is_some_and(|u| u != user_id)
            || self.role.as_deref().is_some_and(|r| !r.eq_ignore_ascii_case(role.as_str()))
        {
            warn!(
                "Service layer: account request overridden to user_id={} role={}",
                user_id, role
            );
        }
        Account {
            u_id: AccountKey::generate(),
            user_id: UserId::from(user_id),
            role,
            credential_ref: self.credential_ref.clone(),
        }
    }
}

fn map_conflict(err: RepositoryError, entity: &'static str, id: &str) -> PortalError {
    if err.is_conflict() {
        PortalError::duplicate(entity, id)
    } else {
        err.into()
    }
}

/// Create a student profile.
pub async fn create_student<R: FullRepository + ?Sized>(
    repo: &R,
    request: &StudentRequest,
) -> PortalResult<Student> {
    let student = request.to_student()?;
    info!("Service layer: creating student {}", student.student_id);

    if repo.find_student(&student.student_id).await?.is_some() {
        return Err(PortalError::duplicate("Student", &student.student_id));
    }
    repo.insert_student(&student)
        .await
        .map_err(|e| map_conflict(e, "Student", student.student_id.as_str()))?;
    Ok(student)
}

/// Create an instructor profile.
pub async fn create_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    request: &InstructorRequest,
) -> PortalResult<Instructor> {
    let instructor = request.to_instructor()?;
    info!("Service layer: creating instructor {}", instructor.instructor_id);

    if repo.find_instructor(&instructor.instructor_id).await?.is_some() {
        return Err(PortalError::duplicate("Instructor", &instructor.instructor_id));
    }
    repo.insert_instructor(&instructor)
        .await
        .map_err(|e| map_conflict(e, "Instructor", instructor.instructor_id.as_str()))?;
    Ok(instructor)
}

/// Create a login account for an existing profile (or a dean).
pub async fn create_account<R: FullRepository + ?Sized>(
    repo: &R,
    request: &AccountRequest,
) -> PortalResult<Account> {
    let account = request.to_account()?;
    info!(
        "Service layer: creating {} account {}",
        account.role, account.user_id
    );

    match account.role {
        Role::Student => {
            let id = StudentId::from(account.user_id.as_str());
            if repo.find_student(&id).await?.is_none() {
                return Err(PortalError::StudentNotFound(id));
            }
        }
        Role::Instructor => {
            let id = InstructorId::from(account.user_id.as_str());
            if repo.find_instructor(&id).await?.is_none() {
                return Err(PortalError::InstructorNotFound(id.0));
            }
        }
        Role::Dean => {}
    }

    if repo.find_account(&account.user_id).await?.is_some() {
        return Err(PortalError::duplicate("Account", &account.user_id));
    }
    repo.insert_account(&account)
        .await
        .map_err(|e| map_conflict(e, "Account", account.user_id.as_str()))?;
    Ok(account)
}

/// Create a student profile and its account atomically.
pub async fn register_student<R: FullRepository + ?Sized>(
    repo: &R,
    student: &StudentRequest,
    account: &AccountRequest,
) -> PortalResult<Registration> {
    let student = student.to_student()?;
    let account = account.bound_to(student.student_id.as_str(), Role::Student);
    info!("Service layer: registering student {}", student.student_id);

    if repo.find_student(&student.student_id).await?.is_some() {
        return Err(PortalError::duplicate("Student", &student.student_id));
    }
    if repo.find_account(&account.user_id).await?.is_some() {
        return Err(PortalError::duplicate("Account", &account.user_id));
    }

    repo.register_student(&student, &account)
        .await
        .map_err(|e| map_conflict(e, "Student", student.student_id.as_str()))?;

    Ok(Registration {
        profile_key: student.s_id.0,
        user_id: account.user_id,
        role: account.role,
    })
}

/// Create an instructor profile and its account atomically.
pub async fn register_instructor<R: FullRepository + ?Sized>(
    repo: &R,
    instructor: &InstructorRequest,
    account: &AccountRequest,
) -> PortalResult<Registration> {
    let instructor = instructor.to_instructor()?;
    let account = account.bound_to(instructor.instructor_id.as_str(), Role::Instructor);
    info!(
        "Service layer: registering instructor {}",
        instructor.instructor_id
    );

    if repo.find_instructor(&instructor.instructor_id).await?.is_some() {
        return Err(PortalError::duplicate("Instructor", &instructor.instructor_id));
    }
    if repo.find_account(&account.user_id).await?.is_some() {
        return Err(PortalError::duplicate("Account", &account.user_id));
    }

    repo.register_instructor(&instructor, &account)
        .await
        .map_err(|e| map_conflict(e, "Instructor", instructor.instructor_id.as_str()))?;

    Ok(Registration {
        profile_key: instructor.i_id.0,
        user_id: account.user_id,
        role: account.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ErrorKind;

    #[test]
    fn test_account_request_rejects_unknown_role() {
        let request = AccountRequest {
            user_id: Some("S1".to_string()),
            role: Some("janitor".to_string()),
            credential_ref: None,
        };
        assert_eq!(request.to_account().unwrap_err().kind(), ErrorKind::InvalidField);
    }

    #[test]
    fn test_account_request_requires_user_id_and_role() {
        let request = AccountRequest::default();
        match request.to_account() {
            Err(PortalError::MissingField(field)) => assert_eq!(field, "user_id"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_bound_account_follows_profile() {
        let request = AccountRequest {
            user_id: Some("someone-else".to_string()),
            role: Some("dean".to_string()),
            credential_ref: Some("cred-1".to_string()),
        };
        let account = request.bound_to("I7", Role::Instructor);
        assert_eq!(account.user_id.as_str(), "I7");
        assert_eq!(account.role, Role::Instructor);
        assert_eq!(account.credential_ref.as_deref(), Some("cred-1"));
    }

    #[test]
    fn test_generated_keys_use_entity_prefix() {
        let student = StudentRequest {
            student_id: Some("S1".to_string()),
            full_name: Some("Ada".to_string()),
        }
        .to_student()
        .unwrap();
        assert!(student.s_id.as_str().starts_with("student_"));
    }
}
