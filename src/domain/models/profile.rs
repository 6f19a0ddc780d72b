use serde::Serialize;
use uuid::Uuid;

use crate::domain::models::role::ProfileKind;

/// Profile fields for a new professor. Professors start available for
/// mentoring assignments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfessor {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub specialization_id: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudent {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub active: bool,
    pub city_id: i32,
    pub faculty_id: i32,
    pub faculty_course_id: i32,
    pub year_of_study_id: i32,
    pub cv: Option<String>,
}

/// Profile fields for a new mentor. Mentors start activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMentor {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub occupation: String,
    pub email: String,
    pub address: String,
    pub firm_id: i32,
    pub years_of_experience: i32,
    pub competence: String,
    pub cv: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPerson {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub faculty_id: i32,
}

/// The domain profile created alongside a credential, one variant per
/// registration kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewProfile {
    Professor(NewProfessor),
    Student(NewStudent),
    Mentor(NewMentor),
    Person(NewPerson),
}

impl NewProfile {
    pub fn kind(&self) -> ProfileKind {
        match self {
            NewProfile::Professor(_) => ProfileKind::Professor,
            NewProfile::Student(_) => ProfileKind::Student,
            NewProfile::Mentor(_) => ProfileKind::Mentor,
            NewProfile::Person(_) => ProfileKind::Person,
        }
    }

    /// The value of the `given_name` claim attached to the credential at
    /// registration time, shown by downstream UI.
    pub fn display_name(&self) -> &str {
        match self {
            NewProfile::Professor(p) => &p.name,
            NewProfile::Student(s) => &s.first_name,
            NewProfile::Mentor(m) => &m.first_name,
            NewProfile::Person(p) => &p.name,
        }
    }
}

/// Identity of a completed registration. The confirmation token is minted
/// inside the same transaction and delivered out of band afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisteredAccount {
    pub credential_id: Uuid,
    pub profile_id: Uuid,
    pub kind: ProfileKind,
    #[serde(skip_serializing)]
    pub confirmation_token: Uuid,
}

/// Uniform listing row across the four profile tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub credential_id: Uuid,
    pub kind: ProfileKind,
    pub display_name: String,
}
