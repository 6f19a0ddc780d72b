use serde::{Deserialize, Serialize};

use crate::domain::{
    error::ValidationErrors,
    models::{
        credential::{NewCredential, normalize_identifier},
        policy::PasswordPolicy,
        profile::{NewMentor, NewPerson, NewProfessor, NewProfile, NewStudent},
        role::ProfileKind,
    },
};

/// Minimal well-formedness check for an email address: one `@` with a
/// non-empty local part and a dotted, non-empty domain. Anything stricter
/// belongs to the confirmation mail round trip.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if value.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

fn require(errors: &mut ValidationErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, format!("The {} field is required.", field));
    }
}

fn require_selection(errors: &mut ValidationErrors, field: &str, value: i32) {
    if value <= 0 {
        errors.add(field, format!("The {} field is required.", field));
    }
}

/// Shared account-credential checks for every registration form: email
/// shape, password policy, and the confirmation match. All failures are
/// accumulated.
fn validate_account_fields(
    errors: &mut ValidationErrors,
    policy: &PasswordPolicy,
    email: &str,
    password: &str,
    confirm_password: &str,
) {
    require(errors, "email", email);
    if !email.trim().is_empty() && !is_valid_email(email.trim()) {
        errors.add("email", "The email address is not valid.");
    }
    if password.is_empty() {
        errors.add("password", "The password field is required.");
    } else if let Err(message) = policy.check(password) {
        errors.add("password", message);
    }
    if confirm_password != password {
        errors.add(
            "confirm_password",
            "The password and confirmation password do not match.",
        );
    }
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}

/// Registration submission for a professor account. Password fields are
/// never serialized, so a re-rendered form cannot echo them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfessorRegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub specialization_id: i32,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentRegistrationForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub city_id: i32,
    #[serde(default)]
    pub faculty_id: i32,
    #[serde(default)]
    pub faculty_course_id: i32,
    #[serde(default)]
    pub year_of_study_id: i32,
    #[serde(default)]
    pub cv: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MentorRegistrationForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub firm_id: i32,
    #[serde(default)]
    pub years_of_experience: i32,
    #[serde(default)]
    pub competence: String,
    #[serde(default)]
    pub cv: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonRegistrationForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub faculty_id: i32,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default, skip_serializing)]
    pub confirm_password: String,
}

/// One registration submission, closed over the four kinds.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RegistrationForm {
    Professor(ProfessorRegistrationForm),
    Student(StudentRegistrationForm),
    Mentor(MentorRegistrationForm),
    Person(PersonRegistrationForm),
}

impl RegistrationForm {
    pub fn kind(&self) -> ProfileKind {
        match self {
            RegistrationForm::Professor(_) => ProfileKind::Professor,
            RegistrationForm::Student(_) => ProfileKind::Student,
            RegistrationForm::Mentor(_) => ProfileKind::Mentor,
            RegistrationForm::Person(_) => ProfileKind::Person,
        }
    }

    /// Structural validation: collects every field error in one pass.
    pub fn validate(&self, policy: &PasswordPolicy) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self {
            RegistrationForm::Professor(f) => {
                require(&mut errors, "name", &f.name);
                require(&mut errors, "phone", &f.phone);
                require(&mut errors, "address", &f.address);
                require_selection(&mut errors, "specialization_id", f.specialization_id);
                validate_account_fields(
                    &mut errors,
                    policy,
                    &f.email,
                    &f.password,
                    &f.confirm_password,
                );
            }
            RegistrationForm::Student(f) => {
                require(&mut errors, "first_name", &f.first_name);
                require(&mut errors, "last_name", &f.last_name);
                require_selection(&mut errors, "city_id", f.city_id);
                require_selection(&mut errors, "faculty_id", f.faculty_id);
                require_selection(&mut errors, "faculty_course_id", f.faculty_course_id);
                require_selection(&mut errors, "year_of_study_id", f.year_of_study_id);
                validate_account_fields(
                    &mut errors,
                    policy,
                    &f.email,
                    &f.password,
                    &f.confirm_password,
                );
            }
            RegistrationForm::Mentor(f) => {
                require(&mut errors, "first_name", &f.first_name);
                require(&mut errors, "last_name", &f.last_name);
                require(&mut errors, "title", &f.title);
                require(&mut errors, "occupation", &f.occupation);
                require(&mut errors, "address", &f.address);
                require(&mut errors, "competence", &f.competence);
                require_selection(&mut errors, "firm_id", f.firm_id);
                if f.years_of_experience < 0 {
                    errors.add(
                        "years_of_experience",
                        "The years_of_experience field must not be negative.",
                    );
                }
                validate_account_fields(
                    &mut errors,
                    policy,
                    &f.email,
                    &f.password,
                    &f.confirm_password,
                );
            }
            RegistrationForm::Person(f) => {
                require(&mut errors, "name", &f.name);
                require(&mut errors, "phone", &f.phone);
                require(&mut errors, "address", &f.address);
                require_selection(&mut errors, "faculty_id", f.faculty_id);
                validate_account_fields(
                    &mut errors,
                    policy,
                    &f.email,
                    &f.password,
                    &f.confirm_password,
                );
            }
        }
        errors.into_result()
    }

    /// Split a validated form into the credential record, the cleartext
    /// password for the store to hash, and the profile payload. The
    /// profile's contact email mirrors the normalized account email.
    pub fn into_parts(self) -> (NewCredential, String, NewProfile) {
        match self {
            RegistrationForm::Professor(f) => {
                let credential = NewCredential::active(&f.email);
                let profile = NewProfile::Professor(NewProfessor {
                    name: f.name.trim().to_string(),
                    phone: f.phone.trim().to_string(),
                    address: f.address.trim().to_string(),
                    specialization_id: f.specialization_id,
                });
                (credential, f.password, profile)
            }
            RegistrationForm::Student(f) => {
                let credential = NewCredential::active(&f.email);
                let profile = NewProfile::Student(NewStudent {
                    first_name: f.first_name.trim().to_string(),
                    last_name: f.last_name.trim().to_string(),
                    email: normalize_identifier(&f.email),
                    active: f.active,
                    city_id: f.city_id,
                    faculty_id: f.faculty_id,
                    faculty_course_id: f.faculty_course_id,
                    year_of_study_id: f.year_of_study_id,
                    cv: optional_text(&f.cv),
                });
                (credential, f.password, profile)
            }
            RegistrationForm::Mentor(f) => {
                let credential = NewCredential::active(&f.email);
                let profile = NewProfile::Mentor(NewMentor {
                    first_name: f.first_name.trim().to_string(),
                    last_name: f.last_name.trim().to_string(),
                    title: f.title.trim().to_string(),
                    occupation: f.occupation.trim().to_string(),
                    email: normalize_identifier(&f.email),
                    address: f.address.trim().to_string(),
                    firm_id: f.firm_id,
                    years_of_experience: f.years_of_experience,
                    competence: f.competence.trim().to_string(),
                    cv: optional_text(&f.cv),
                });
                (credential, f.password, profile)
            }
            RegistrationForm::Person(f) => {
                let credential = NewCredential::active(&f.email);
                let profile = NewProfile::Person(NewPerson {
                    name: f.name.trim().to_string(),
                    phone: f.phone.trim().to_string(),
                    address: f.address.trim().to_string(),
                    faculty_id: f.faculty_id,
                });
                (credential, f.password, profile)
            }
        }
    }
}
