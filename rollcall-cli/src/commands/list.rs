//! `rollcall --list`: print the roster as the engine would see it.

use anyhow::Result;
use colored::Colorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use rollcall_core::Person;

use super::{config, RunStatus};

#[derive(Tabled)]
struct RosterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "ROLE")]
    role: String,
    #[tabled(rename = "MANAGER")]
    manager: String,
    #[tabled(rename = "MEMBERSHIPS")]
    memberships: String,
}

impl RosterRow {
    fn from_person(person: &Person, email_domain: &str) -> Self {
        let person = person.with_manager_email(email_domain);
        Self {
            id: person.key().to_string(),
            name: person.label().to_string(),
            role: person.role().to_string(),
            manager: person.manager_ref.clone(),
            memberships: person.memberships.iter().cloned().collect::<Vec<_>>().join(", "),
        }
    }
}

pub fn run() -> Result<RunStatus> {
    let config = config::load()?;
    let people = rollcall_sync::fetch_roster(&config)?;

    if people.is_empty() {
        println!("{}", "Roster is empty.".yellow());
        return Ok(RunStatus::Completed);
    }

    let domain = &config.organization.email_domain;
    let rows: Vec<RosterRow> = people.iter().map(|p| RosterRow::from_person(p, domain)).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("{} roster entries", people.len().to_string().bold());
    Ok(RunStatus::Completed)
}
