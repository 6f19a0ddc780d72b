pub mod cities;
pub mod credential_claims;
pub mod credential_roles;
pub mod credentials;
pub mod email_confirmation_tokens;
pub mod external_logins;
pub mod faculties;
pub mod faculty_courses;
pub mod firms;
pub mod mentors;
pub mod password_reset_tokens;
pub mod persons;
pub mod professors;
pub mod specializations;
pub mod students;
pub mod two_factor_codes;
pub mod year_of_studies;
