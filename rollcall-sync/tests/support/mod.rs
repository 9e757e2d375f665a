//! In-memory directories for engine tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashSet};

use rollcall_core::{Person, RecordHandle};
use rollcall_directory::{
    AppDirectory, BearerToken, ContentShare, CreateOutcome, DirectoryAdapter, DirectoryError,
    GroupDirectory, GroupSelection, RunContext,
};
use rollcall_sync::{Confirm, EngineSettings};

fn unavailable(operation: &str) -> DirectoryError {
    DirectoryError::Request {
        operation: operation.to_string(),
        status: 500,
        detail: "injected failure".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Identity provider
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeIdp {
    /// (email, id) in creation order.
    pub users: RefCell<Vec<(String, String)>>,
    /// (user id, group name).
    pub memberships: RefCell<Vec<(String, String)>>,
    pub known_groups: HashSet<String>,
    pub tokens_issued: Cell<u32>,
    pub fail_token: Cell<bool>,
    /// Token generation seen by each lookup, in call order.
    pub lookup_generations: RefCell<Vec<u32>>,
    next_id: Cell<u32>,
}

impl FakeIdp {
    pub fn with_groups(groups: &[&str]) -> Self {
        Self {
            known_groups: groups.iter().map(|g| g.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn seed(&self, email: &str) -> String {
        let id = format!("u-seed-{}", self.users.borrow().len());
        self.users.borrow_mut().push((email.to_string(), id.clone()));
        id
    }

    pub fn has_user(&self, email: &str) -> bool {
        self.users.borrow().iter().any(|(e, _)| e == email)
    }

    pub fn groups_of(&self, email: &str) -> Vec<String> {
        let users = self.users.borrow();
        let Some((_, id)) = users.iter().find(|(e, _)| e == email) else {
            return Vec::new();
        };
        self.memberships
            .borrow()
            .iter()
            .filter(|(uid, _)| uid == id)
            .map(|(_, g)| g.clone())
            .collect()
    }
}

impl DirectoryAdapter for FakeIdp {
    fn system(&self) -> &str {
        "identity provider"
    }

    fn find_by_key(&self, ctx: &RunContext, key: &str) -> Result<Option<RecordHandle>, DirectoryError> {
        ctx.bearer()?;
        self.lookup_generations.borrow_mut().push(ctx.generation());
        Ok(self
            .users
            .borrow()
            .iter()
            .find(|(email, _)| email == key)
            .map(|(_, id)| RecordHandle::from(id.as_str())))
    }

    fn create(&self, ctx: &RunContext, person: &Person) -> Result<CreateOutcome, DirectoryError> {
        ctx.bearer()?;
        if let Some((_, id)) = self.users.borrow().iter().find(|(e, _)| e == person.key()) {
            return Ok(CreateOutcome::AlreadyPresent(Some(RecordHandle::from(id.as_str()))));
        }
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let id = format!("u-{n}");
        self.users.borrow_mut().push((person.key().to_string(), id.clone()));
        Ok(CreateOutcome::Created(RecordHandle::from(id)))
    }

    fn update(&self, _ctx: &RunContext, _handle: &RecordHandle, _person: &Person) -> Result<(), DirectoryError> {
        Ok(())
    }

    fn delete(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        self.users.borrow_mut().retain(|(_, id)| id != handle.as_str());
        self.memberships.borrow_mut().retain(|(uid, _)| uid != handle.as_str());
        Ok(())
    }
}

impl GroupDirectory for FakeIdp {
    fn acquire_token(&self) -> Result<BearerToken, DirectoryError> {
        if self.fail_token.get() {
            return Err(DirectoryError::Auth("invalid_client".to_string()));
        }
        let n = self.tokens_issued.get() + 1;
        self.tokens_issued.set(n);
        Ok(BearerToken::new(format!("token-{n}")))
    }

    fn add_to_group(&self, _ctx: &RunContext, handle: &RecordHandle, group: &str) -> Result<(), DirectoryError> {
        if !self.known_groups.contains(group) {
            return Err(DirectoryError::GroupNotFound {
                system: "identity provider".to_string(),
                group: group.to_string(),
            });
        }
        self.memberships
            .borrow_mut()
            .push((handle.to_string(), group.to_string()));
        Ok(())
    }

    fn remove_from_group(&self, _ctx: &RunContext, handle: &RecordHandle, group: &str) -> Result<(), DirectoryError> {
        self.memberships
            .borrow_mut()
            .retain(|(uid, g)| !(uid == handle.as_str() && g == group));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Business app
// ---------------------------------------------------------------------------

pub struct FakeApp {
    pub name: String,
    /// Stored persons in creation order; the email is the record id.
    pub records: RefCell<Vec<Person>>,
    pub fail_for: HashSet<String>,
    pub updates: RefCell<Vec<String>>,
}

impl FakeApp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            records: RefCell::new(Vec::new()),
            fail_for: HashSet::new(),
            updates: RefCell::new(Vec::new()),
        }
    }

    pub fn failing_for(mut self, email: &str) -> Self {
        self.fail_for.insert(email.to_string());
        self
    }

    pub fn seed(&self, email: &str) {
        self.records.borrow_mut().push(Person::minimal(email));
    }

    pub fn has(&self, email: &str) -> bool {
        self.records.borrow().iter().any(|p| p.key() == email)
    }

    pub fn record(&self, email: &str) -> Option<Person> {
        self.records.borrow().iter().find(|p| p.key() == email).cloned()
    }
}

impl DirectoryAdapter for FakeApp {
    fn system(&self) -> &str {
        &self.name
    }

    fn find_by_key(&self, _ctx: &RunContext, key: &str) -> Result<Option<RecordHandle>, DirectoryError> {
        Ok(self.has(key).then(|| RecordHandle::from(key)))
    }

    fn create(&self, _ctx: &RunContext, person: &Person) -> Result<CreateOutcome, DirectoryError> {
        if self.fail_for.contains(person.key()) {
            return Err(unavailable("create"));
        }
        if self.has(person.key()) {
            return Ok(CreateOutcome::AlreadyPresent(None));
        }
        self.records.borrow_mut().push(person.clone());
        Ok(CreateOutcome::Created(RecordHandle::from(person.key())))
    }

    fn update(&self, _ctx: &RunContext, handle: &RecordHandle, person: &Person) -> Result<(), DirectoryError> {
        if self.fail_for.contains(person.key()) {
            return Err(unavailable("update"));
        }
        self.updates.borrow_mut().push(handle.to_string());
        Ok(())
    }

    fn delete(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        if self.fail_for.contains(handle.as_str()) {
            return Err(unavailable("delete"));
        }
        self.records.borrow_mut().retain(|p| p.key() != handle.as_str());
        Ok(())
    }
}

impl AppDirectory for FakeApp {
    fn list_keys(&self, _ctx: &RunContext) -> Result<Vec<String>, DirectoryError> {
        Ok(self.records.borrow().iter().map(|p| p.id.clone()).collect())
    }
}

// ---------------------------------------------------------------------------
// Content share
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeShare {
    /// Emails the content share knows after a profile sync.
    pub users: BTreeSet<String>,
    pub shared: RefCell<BTreeSet<String>>,
    pub fail_sync: bool,
    pub syncs: Cell<u32>,
    pub grants: Cell<u32>,
    pub revokes: Cell<u32>,
}

impl FakeShare {
    pub fn knowing(users: &[&str]) -> Self {
        Self {
            users: users.iter().map(|u| u.to_string()).collect(),
            ..Self::default()
        }
    }
}

impl ContentShare for FakeShare {
    fn system(&self) -> &str {
        "content share"
    }

    fn tag(&self) -> &str {
        "content-share"
    }

    fn sync_profiles(&self, _ctx: &RunContext) -> Result<(), DirectoryError> {
        self.syncs.set(self.syncs.get() + 1);
        if self.fail_sync {
            return Err(unavailable("profile sync"));
        }
        Ok(())
    }

    fn find_by_key(&self, _ctx: &RunContext, email: &str) -> Result<Option<RecordHandle>, DirectoryError> {
        Ok(self.users.contains(email).then(|| RecordHandle::from(email)))
    }

    fn grant(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        self.grants.set(self.grants.get() + 1);
        self.shared.borrow_mut().insert(handle.to_string());
        Ok(())
    }

    fn revoke(&self, _ctx: &RunContext, handle: &RecordHandle) -> Result<(), DirectoryError> {
        self.revokes.set(self.revokes.get() + 1);
        self.shared.borrow_mut().remove(handle.as_str());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Confirmation and fixtures
// ---------------------------------------------------------------------------

/// Answers every prompt the same way and remembers what was asked.
pub struct ScriptedConfirm {
    pub answer: bool,
    pub asked: Vec<String>,
}

impl ScriptedConfirm {
    pub fn yes() -> Self {
        Self { answer: true, asked: Vec::new() }
    }

    pub fn no() -> Self {
        Self { answer: false, asked: Vec::new() }
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&mut self, email: &str) -> bool {
        self.asked.push(email.to_string());
        self.answer
    }
}

pub fn settings() -> EngineSettings {
    EngineSettings {
        email_domain: "example.com".to_string(),
        manager_groups: GroupSelection::parse("Managers, Everyone"),
        user_groups: GroupSelection::parse("Everyone"),
        token_refresh_every: 50,
        protected_ids: Vec::new(),
        limit: None,
        deadline: None,
        clean_app: None,
        exclude_patterns: vec!["^cto-test".to_string()],
    }
}

pub fn person(id: &str, directs: u32, tags: &[&str]) -> Person {
    Person {
        direct_report_count: directs,
        manager_ref: "cn=John_Smith,l=amer,dc=example,dc=com".to_string(),
        memberships: tags.iter().map(|t| t.to_string()).collect(),
        ..Person::minimal(id)
    }
}

pub const GROUPS: &[&str] = &["Managers", "Everyone"];
