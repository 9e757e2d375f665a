//! Payload context: the named placeholders a template may use.

use serde::{Deserialize, Serialize};

use rollcall_core::Person;

use crate::error::RenderError;

/// Flat rendering payload.
///
/// Every field is always present (empty string when unknown) so templates
/// never fail on an absent variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadContext {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    /// Manager email (already normalized by the caller).
    pub manager: String,
    /// Downstream role code chosen from the person's role.
    pub role: String,
    pub line_of_business: String,
    /// Downstream record id (group member value, share target).
    pub user_id: String,
}

impl PayloadContext {
    /// Build a context from a roster person; `role` and `user_id` start empty.
    pub fn for_person(person: &Person) -> Self {
        Self {
            email: person.key().to_string(),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            display_name: person.display_name.clone(),
            manager: person.manager_ref.clone(),
            role: String::new(),
            line_of_business: person.line_of_business.clone().unwrap_or_default(),
            user_id: String::new(),
        }
    }

    /// Context carrying only a downstream record id.
    pub fn for_user_id(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
