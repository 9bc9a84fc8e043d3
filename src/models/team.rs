//! Team model.
//!
//! A team is a label applied to users: it has a name and a membership set and
//! nothing else. Teams are created on first use via the upsert path.

use serde::{Deserialize, Serialize};

/// A team, identified by name alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
}

/// Input for a single member in a team add/update request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    /// A member is valid when both its user id and username are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.user_id.is_empty() && !self.username.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_validation() {
        let ok = TeamMember {
            user_id: "u1".into(),
            username: "Alice".into(),
            is_active: true,
        };
        assert!(ok.is_valid());

        let no_id = TeamMember {
            user_id: "".into(),
            username: "Alice".into(),
            is_active: true,
        };
        assert!(!no_id.is_valid());

        let no_name = TeamMember {
            user_id: "u1".into(),
            username: "".into(),
            is_active: false,
        };
        assert!(!no_name.is_valid());
    }
}
