use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role carried by a principal.
///
/// Closed set; comparisons and role-set membership are exhaustive matches
/// rather than string equality.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employer,
    Specialist,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Employer, Role::Specialist];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employer => "employer",
            Role::Specialist => "specialist",
        }
    }

    fn bit(self) -> u8 {
        match self {
            Role::Admin => 0b001,
            Role::Employer => 0b010,
            Role::Specialist => 0b100,
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employer" => Ok(Role::Employer),
            "specialist" => Ok(Role::Specialist),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Set of roles an operation accepts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Any authenticated principal.
    pub const fn any() -> Self {
        Self(0b111)
    }

    pub fn only(role: Role) -> Self {
        Self(role.bit())
    }

    pub fn of(roles: &[Role]) -> Self {
        Self(roles.iter().fold(0, |acc, r| acc | r.bit()))
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_any(&self) -> bool {
        *self == Self::any()
    }

    pub fn roles(&self) -> impl Iterator<Item = Role> + '_ {
        Role::ALL.into_iter().filter(|r| self.contains(*r))
    }
}

impl core::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.is_any() {
            return f.write_str("any");
        }
        let names: Vec<&str> = self.roles().map(|r| r.as_str()).collect();
        f.write_str(&names.join("|"))
    }
}
