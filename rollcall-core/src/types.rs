//! Roster domain types.
//!
//! [`Person`] deserializes directly from the identity feed's record shape
//! (`id`, `givenname`, `sn`, `displayname`, `manager`, `num_directs`, `lob`,
//! `apps`).

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::convert_manager_reference_to_email;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque identifier a downstream system assigned to a person's record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle(pub String);

impl RecordHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordHandle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Organizational role, derived from the direct report count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    IndividualContributor,
    Manager,
}

impl Role {
    pub fn from_direct_reports(count: u32) -> Self {
        if count > 0 {
            Role::Manager
        } else {
            Role::IndividualContributor
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::IndividualContributor => write!(f, "individual contributor"),
            Role::Manager => write!(f, "manager"),
        }
    }
}

// ---------------------------------------------------------------------------
// Person
// ---------------------------------------------------------------------------

/// One roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Login / email; the join key across every downstream system.
    #[serde(default)]
    pub id: String,
    #[serde(rename = "givenname", default)]
    pub first_name: String,
    #[serde(rename = "sn", default)]
    pub last_name: String,
    #[serde(rename = "displayname", default)]
    pub display_name: String,
    /// Directory-native manager reference (an LDAP DN in practice).
    #[serde(rename = "manager", default)]
    pub manager_ref: String,
    #[serde(rename = "num_directs", default)]
    pub direct_report_count: u32,
    #[serde(rename = "lob", default, skip_serializing_if = "Option::is_none")]
    pub line_of_business: Option<String>,
    /// Tags naming the business apps / content share this person belongs in.
    #[serde(rename = "apps", default)]
    pub memberships: BTreeSet<String>,
}

impl Person {
    /// A person known only by id; used for clean-mode removals.
    pub fn minimal(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: String::new(),
            last_name: String::new(),
            display_name: String::new(),
            manager_ref: String::new(),
            direct_report_count: 0,
            line_of_business: None,
            memberships: BTreeSet::new(),
        }
    }

    pub fn role(&self) -> Role {
        Role::from_direct_reports(self.direct_report_count)
    }

    /// Trimmed id, as used in downstream equality filters.
    pub fn key(&self) -> &str {
        self.id.trim()
    }

    /// Display name, falling back to the id when the feed left it blank.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            self.key()
        } else {
            &self.display_name
        }
    }

    pub fn is_tagged(&self, tag: &str) -> bool {
        self.memberships.contains(tag)
    }

    /// Returns a copy whose manager reference is normalized to an email.
    pub fn with_manager_email(&self, email_domain: &str) -> Self {
        Self {
            manager_ref: convert_manager_reference_to_email(&self.manager_ref, email_domain),
            ..self.clone()
        }
    }

    /// Returns a copy carrying `defaults` when the feed supplied no tags.
    pub fn with_default_memberships(self, defaults: &[String]) -> Self {
        if !self.memberships.is_empty() {
            return self;
        }
        Self {
            memberships: defaults.iter().cloned().collect(),
            ..self
        }
    }
}

/// Envelope returned by the roster feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterPage {
    #[serde(default)]
    pub items: Vec<Person>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
