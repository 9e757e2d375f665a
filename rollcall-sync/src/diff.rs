//! Clean-mode diff: provisioned accounts that the roster no longer lists.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use rollcall_core::Person;

use crate::error::SyncError;

/// Asks whether one stray account may be removed.
pub trait Confirm {
    fn confirm(&mut self, email: &str) -> bool;
}

/// Roster index plus the rules that keep accounts off the removal list.
pub struct DiffReconciler<'p> {
    by_key: HashMap<String, &'p Person>,
    excludes: Vec<Regex>,
    protected: HashSet<String>,
}

impl<'p> DiffReconciler<'p> {
    pub fn new(
        roster: &'p [Person],
        exclude_patterns: &[String],
        protected_ids: &[String],
    ) -> Result<Self, SyncError> {
        let excludes = exclude_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| SyncError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            by_key: roster
                .iter()
                .map(|person| (normalize(person.key()), person))
                .collect(),
            excludes,
            protected: protected_ids.iter().map(|id| normalize(id)).collect(),
        })
    }

    pub fn roster_person(&self, email: &str) -> Option<&'p Person> {
        self.by_key.get(&normalize(email)).copied()
    }

    /// Patterns see the same lower-cased, trimmed form as roster matching.
    fn is_excluded(&self, email: &str) -> bool {
        let email = normalize(email);
        self.excludes.iter().any(|re| re.is_match(&email))
    }

    /// Listed emails absent from the roster, in listing order, without
    /// duplicates, excluded patterns or protected ids.
    pub fn strays(&self, listing: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        listing
            .iter()
            .map(|email| email.trim())
            .filter(|email| !email.is_empty())
            .filter(|email| self.roster_person(email).is_none())
            .filter(|email| !self.is_excluded(email))
            .filter(|email| !self.protected.contains(&normalize(email)))
            .filter(|email| seen.insert(normalize(email)))
            .map(str::to_string)
            .collect()
    }
}

fn normalize(id: &str) -> String {
    id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn roster(ids: &[&str]) -> Vec<Person> {
        ids.iter().map(|id| Person::minimal(*id)).collect()
    }

    fn listing(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn default_excludes() -> Vec<String> {
        vec!["^cto-test".to_string()]
    }

    #[test]
    fn only_unlisted_accounts_are_strays() {
        let people = roster(&["a@x.com", "b@x.com"]);
        let diff = DiffReconciler::new(&people, &default_excludes(), &[]).unwrap();
        let strays = diff.strays(&listing(&["a@x.com", "b@x.com", "stray@x.com"]));
        assert_eq!(strays, vec!["stray@x.com"]);
    }

    #[test]
    fn test_accounts_are_never_offered() {
        let people = roster(&["a@x.com"]);
        let diff = DiffReconciler::new(&people, &default_excludes(), &[]).unwrap();
        let strays = diff.strays(&listing(&["cto-test@x.com", "cto-test-2@x.com", "z@x.com"]));
        assert_eq!(strays, vec!["z@x.com"]);
    }

    #[rstest]
    #[case("^svc-", "svc-backup@x.com", false)]
    #[case("^svc-", "ops-svc@x.com", true)]
    #[case("^cto-test", "CTO-Test@x.com", false)]
    #[case("^cto-test", "  cto-test-2@x.com", false)]
    #[case("@partner\\.com$", "joe@partner.com", false)]
    #[case("@partner\\.com$", "joe@partner.com.au", true)]
    fn exclude_patterns_match_the_listed_email(
        #[case] pattern: &str,
        #[case] email: &str,
        #[case] offered: bool,
    ) {
        let people = roster(&[]);
        let diff = DiffReconciler::new(&people, &[pattern.to_string()], &[]).unwrap();
        assert_eq!(!diff.strays(&listing(&[email])).is_empty(), offered);
    }

    #[test]
    fn matching_ignores_case_and_whitespace() {
        let people = roster(&["Jane.Doe@X.com"]);
        let diff = DiffReconciler::new(&people, &[], &[]).unwrap();
        assert!(diff.strays(&listing(&[" jane.doe@x.com "])).is_empty());
    }

    #[test]
    fn strays_are_deduplicated_in_listing_order() {
        let people = roster(&[]);
        let diff = DiffReconciler::new(&people, &[], &[]).unwrap();
        let strays = diff.strays(&listing(&["b@x.com", "a@x.com", "B@x.com"]));
        assert_eq!(strays, vec!["b@x.com", "a@x.com"]);
    }

    #[test]
    fn protected_ids_are_kept() {
        let people = roster(&[]);
        let diff = DiffReconciler::new(&people, &[], &["Admin@x.com".to_string()]).unwrap();
        assert_eq!(diff.strays(&listing(&["admin@x.com", "c@x.com"])), vec!["c@x.com"]);
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let people = roster(&[]);
        let result = DiffReconciler::new(&people, &["(".to_string()], &[]);
        assert!(matches!(result, Err(SyncError::Pattern { .. })));
    }
}
