use serde::{Deserialize, Serialize};

/// The closed set of role names a credential can hold. Roles are granted
/// once, inside the registration transaction, and never removed here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Administrator,
    Professor,
    Student,
    Mentor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::Professor => "Professor",
            Role::Student => "Student",
            Role::Mentor => "Mentor",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Administrator" => Ok(Role::Administrator),
            "Professor" => Ok(Role::Professor),
            "Student" => Ok(Role::Student),
            "Mentor" => Ok(Role::Mentor),
            _ => Err(format!("{:?} is not a valid Role.", s)),
        }
    }
}

/// The kind of domain profile a registration creates. Every kind carries
/// a fixed role; a person registers as a student-role account without a
/// student profile. No kind grants Administrator — administrator accounts
/// are provisioned out of band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    Professor,
    Student,
    Mentor,
    Person,
}

impl ProfileKind {
    pub fn role(&self) -> Role {
        match self {
            ProfileKind::Professor => Role::Professor,
            ProfileKind::Student => Role::Student,
            ProfileKind::Mentor => Role::Mentor,
            ProfileKind::Person => Role::Student,
        }
    }

    /// Path of the listing the browser is sent to after a successful
    /// registration of this kind.
    pub fn listing_path(&self) -> &'static str {
        match self {
            ProfileKind::Professor => "/professors",
            ProfileKind::Student => "/students",
            ProfileKind::Mentor => "/mentors",
            ProfileKind::Person => "/persons",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileKind::Professor => "professor",
            ProfileKind::Student => "student",
            ProfileKind::Mentor => "mentor",
            ProfileKind::Person => "person",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
