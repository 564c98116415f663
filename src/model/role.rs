use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    System = 4,
    ApiUser = 5,
    Manager = 6,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            4 => Some(Role::System),
            5 => Some(Role::ApiUser),
            6 => Some(Role::Manager),
            _ => None,
        }
    }

    /// Roles allowed to decide on requests and to bypass attendance locks.
    pub fn is_reviewer(self) -> bool {
        matches!(self, Role::Admin | Role::Hr | Role::Manager | Role::System)
    }
}

/// Who is performing an engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl Actor {
    pub fn is_reviewer(&self) -> bool {
        self.role.is_reviewer()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id)
    }

    /// The engine's own identity, used by background jobs.
    pub fn system() -> Self {
        Actor {
            user_id: 0,
            role: Role::System,
            employee_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_ids_round_trip() {
        for id in 1..=6 {
            let role = Role::from_id(id).expect("known role id");
            assert_eq!(role as u8, id);
        }
        assert!(Role::from_id(0).is_none());
        assert!(Role::from_id(7).is_none());
    }

    #[test]
    fn reviewers_are_admin_hr_manager_system() {
        assert!(Role::Admin.is_reviewer());
        assert!(Role::Hr.is_reviewer());
        assert!(Role::Manager.is_reviewer());
        assert!(Role::System.is_reviewer());
        assert!(!Role::Employee.is_reviewer());
        assert!(!Role::ApiUser.is_reviewer());
    }
}
