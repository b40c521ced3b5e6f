// 👤 Member Entity - keyed by member id

use serde::{Deserialize, Serialize};

use crate::error::{require, DomainError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Natural key, unique within the collection
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl Member {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Member {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
        }
    }

    /// Check that every field is filled in
    pub fn validate(&self) -> Result<(), DomainError> {
        require("id", &self.id)?;
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("phone", &self.phone)?;
        Ok(())
    }

    /// The member as it reads back from storage: text fields trimmed.
    pub fn trimmed(self) -> Self {
        Member {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
        }
    }

    /// Apply an edit. The id never changes.
    pub fn apply(&mut self, update: MemberUpdate) {
        self.name = update.name.trim().to_string();
        self.email = update.email.trim().to_string();
        self.phone = update.phone.trim().to_string();
    }
}

/// Editable fields of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl MemberUpdate {
    pub fn validate(&self) -> Result<(), DomainError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("phone", &self.phone)?;
        Ok(())
    }
}

/// Find the first member with this id
pub fn find<'a>(members: &'a [Member], id: &str) -> Option<&'a Member> {
    members.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_validate() {
        let ok = Member::new("M1", "Ana", "ana@example.com", "555-0101");
        let missing = Member::new("M2", "Luis", "", "555-0102");

        assert!(ok.validate().is_ok());
        assert_eq!(missing.validate(), Err(DomainError::MissingField("email")));
    }

    #[test]
    fn test_member_apply_keeps_id() {
        let mut member = Member::new("M1", "Ana", "ana@example.com", "555-0101");
        member.apply(MemberUpdate {
            name: "Ana Ruiz".to_string(),
            email: "ana.ruiz@example.com".to_string(),
            phone: "555-0199".to_string(),
        });

        assert_eq!(member.id, "M1");
        assert_eq!(member.name, "Ana Ruiz");
        assert_eq!(member.phone, "555-0199");
    }
}
