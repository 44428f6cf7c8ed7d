//! Reviewer selection policies.
//!
//! Pure functions over candidate snapshots already loaded from storage.
//! Ties between equally eligible candidates are broken by ascending user ID,
//! so the same snapshot always yields the same pick.

use serde::{Deserialize, Serialize};

use crate::models::User;

/// Reviewers assigned to a new pull request at most.
pub const DEFAULT_MAX_REVIEWERS: usize = 2;

/// Replacement candidates collected per PR during team deactivation.
pub const DEFAULT_REPLACEMENT_POOL_CAP: usize = 10;

/// Tunables for reviewer selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentPolicy {
    pub max_reviewers: usize,
    pub replacement_pool_cap: usize,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            max_reviewers: DEFAULT_MAX_REVIEWERS,
            replacement_pool_cap: DEFAULT_REPLACEMENT_POOL_CAP,
        }
    }
}

/// IDs of eligible candidates (active, not excluded), sorted and deduplicated.
fn eligible_ids(candidates: &[User], excluded: &[&str]) -> Vec<String> {
    let mut ids: Vec<String> = candidates
        .iter()
        .filter(|u| u.is_active && !excluded.contains(&u.user_id.as_str()))
        .map(|u| u.user_id.clone())
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Choose the reviewers for a new pull request.
///
/// Never returns the author and never more than `max_reviewers` IDs.
pub fn select_reviewers(candidates: &[User], author_id: &str, max_reviewers: usize) -> Vec<String> {
    let mut ids = eligible_ids(candidates, &[author_id]);
    ids.truncate(max_reviewers);
    ids
}

/// Choose a single replacement reviewer, skipping everyone in `excluded`.
pub fn pick_replacement(candidates: &[User], excluded: &[&str]) -> Option<String> {
    eligible_ids(candidates, excluded).into_iter().next()
}

/// Add eligible users to a replacement pool until it holds `cap` entries.
///
/// Returns true once the pool is full.
pub fn extend_pool(pool: &mut Vec<String>, users: &[User], excluded: &[&str], cap: usize) -> bool {
    for id in eligible_ids(users, excluded) {
        if pool.len() >= cap {
            break;
        }
        if !pool.contains(&id) {
            pool.push(id);
        }
    }
    pool.len() >= cap
}

/// Positional pairing of outgoing reviewers with replacements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pairing {
    /// (outgoing reviewer, replacement) in outgoing order.
    pub pairs: Vec<(String, String)>,
    /// Outgoing reviewers left without a replacement.
    pub unmatched: Vec<String>,
}

/// Pair the i-th outgoing reviewer with the i-th pool entry.
pub fn pair_replacements(outgoing: &[String], pool: &[String]) -> Pairing {
    let mut pairing = Pairing::default();
    for (i, old) in outgoing.iter().enumerate() {
        match pool.get(i) {
            Some(new) => pairing.pairs.push((old.clone(), new.clone())),
            None => pairing.unmatched.push(old.clone()),
        }
    }
    pairing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, active: bool) -> User {
        User::new(id, id.to_uppercase(), "backend", active)
    }

    #[test]
    fn test_select_reviewers_excludes_author_and_inactive() {
        let candidates = vec![user("u3", true), user("u1", true), user("u2", false)];

        assert_eq!(select_reviewers(&candidates, "u1", 2), vec!["u3"]);
    }

    #[test]
    fn test_select_reviewers_caps_in_id_order() {
        let candidates = vec![
            user("u4", true),
            user("u2", true),
            user("u3", true),
            user("u1", true),
        ];

        assert_eq!(select_reviewers(&candidates, "u1", 2), vec!["u2", "u3"]);
        assert!(select_reviewers(&candidates, "u1", 0).is_empty());
    }

    #[test]
    fn test_selection_is_a_subset_of_the_pool() {
        let candidates: Vec<User> = (0..7).map(|i| user(&format!("u{i}"), i % 3 != 0)).collect();

        for author in ["u0", "u1", "u5"] {
            for cap in 0..5 {
                let picked = select_reviewers(&candidates, author, cap);
                assert!(picked.len() <= cap);
                assert!(!picked.iter().any(|id| id == author));
                for id in &picked {
                    assert!(candidates.iter().any(|u| &u.user_id == id && u.is_active));
                }
            }
        }
    }

    #[test]
    fn test_pick_replacement_skips_excluded() {
        let candidates = vec![user("u1", true), user("u2", true), user("u3", true)];

        assert_eq!(pick_replacement(&candidates, &["u1", "u2"]), Some("u3".into()));
        assert_eq!(pick_replacement(&candidates, &["u1", "u2", "u3"]), None);
    }

    #[test]
    fn test_extend_pool_stops_at_cap() {
        let mut pool = Vec::new();
        let team_a = vec![user("a1", true), user("a2", true)];
        let team_b = vec![user("b1", true), user("b2", false), user("b3", true)];

        assert!(!extend_pool(&mut pool, &team_a, &["a2"], 3));
        assert!(extend_pool(&mut pool, &team_b, &[], 3));
        assert_eq!(pool, vec!["a1", "b1", "b3"]);
    }

    #[test]
    fn test_pair_replacements_positional() {
        let outgoing = vec!["u1".to_string(), "u2".to_string()];

        let pool = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let full = pair_replacements(&outgoing, &pool);
        assert_eq!(
            full.pairs,
            vec![("u1".to_string(), "x".to_string()), ("u2".to_string(), "y".to_string())]
        );
        assert!(full.unmatched.is_empty());

        let short = pair_replacements(&outgoing, &["x".to_string()]);
        assert_eq!(short.pairs.len(), 1);
        assert_eq!(short.unmatched, vec!["u2"]);
    }
}
