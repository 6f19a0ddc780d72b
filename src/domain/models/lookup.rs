use serde::Serialize;

/// One row of a reference table, as offered to a registration form's
/// drop-down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupItem {
    pub id: i32,
    pub name: String,
}

impl LookupItem {
    pub fn new(id: i32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// The drop-down data a registration form of a given kind needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RegistrationLookups {
    Professor {
        specializations: Vec<LookupItem>,
    },
    Student {
        cities: Vec<LookupItem>,
        faculties: Vec<LookupItem>,
        faculty_courses: Vec<LookupItem>,
        years_of_study: Vec<LookupItem>,
    },
    Mentor {
        firms: Vec<LookupItem>,
    },
    Person {
        faculties: Vec<LookupItem>,
    },
}
