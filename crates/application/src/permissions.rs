//! Permission checks for guards and conditional rendering.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::warn;
use warden_domain::{Permission, has_any_grant};

/// Whether authentication is enforced in this deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthEnforcement {
    /// Permissions are checked and guards require a session.
    #[default]
    Enforced,
    /// Every permission check passes and guards allow everything.
    Disabled,
}

impl AuthEnforcement {
    /// Maps the `enforce_authentication` setting.
    #[must_use]
    pub const fn from_flag(enforce: bool) -> Self {
        if enforce { Self::Enforced } else { Self::Disabled }
    }

    /// Returns true when authentication is enforced.
    #[must_use]
    pub const fn is_enforced(self) -> bool {
        matches!(self, Self::Enforced)
    }
}

/// Evaluates requested permissions against a user's grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionPolicy {
    enforcement: AuthEnforcement,
}

impl PermissionPolicy {
    /// Creates a policy. A disabled policy is logged, since it grants
    /// everything to everyone.
    #[must_use]
    pub fn new(enforcement: AuthEnforcement) -> Self {
        if !enforcement.is_enforced() {
            warn!("authentication enforcement is DISABLED: every permission check will pass");
        }
        Self { enforcement }
    }

    /// Policy that checks permissions.
    #[must_use]
    pub const fn enforced() -> Self {
        Self {
            enforcement: AuthEnforcement::Enforced,
        }
    }

    /// The enforcement mode.
    #[must_use]
    pub const fn enforcement(&self) -> AuthEnforcement {
        self.enforcement
    }

    /// Returns true if `held` satisfies `requested`.
    #[must_use]
    pub fn is_permitted(&self, requested: &str, held: &[Permission]) -> bool {
        match self.enforcement {
            AuthEnforcement::Disabled => true,
            AuthEnforcement::Enforced => has_any_grant(held, requested),
        }
    }
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self::enforced()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    owner: Vec<Permission>,
    answers: HashMap<String, bool>,
}

/// Memoizes policy answers for the current permission list.
///
/// Answers are dropped whenever the list they were computed for changes,
/// and on logout.
#[derive(Debug)]
pub struct PermissionCache {
    policy: PermissionPolicy,
    state: Mutex<CacheState>,
}

impl PermissionCache {
    /// Creates an empty cache over `policy`.
    #[must_use]
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(CacheState::default()),
        }
    }

    /// The underlying policy.
    #[must_use]
    pub const fn policy(&self) -> PermissionPolicy {
        self.policy
    }

    /// Cached equivalent of [`PermissionPolicy::is_permitted`].
    pub fn is_permitted(&self, requested: &str, held: &[Permission]) -> bool {
        let mut state = self.state.lock();
        if state.owner != held {
            state.owner = held.to_vec();
            state.answers.clear();
        }
        if let Some(answer) = state.answers.get(requested) {
            return *answer;
        }
        let answer = self.policy.is_permitted(requested, held);
        state.answers.insert(requested.to_string(), answer);
        answer
    }

    /// Forgets every cached answer.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.owner.clear();
        state.answers.clear();
    }

    /// Number of cached answers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().answers.len()
    }

    /// Returns true when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(values: &[&str]) -> Vec<Permission> {
        values.iter().copied().map(Permission::from).collect()
    }

    #[test]
    fn enforced_policy_uses_matcher() {
        let policy = PermissionPolicy::enforced();
        let held = grants(&["cohort:read,write"]);
        assert!(policy.is_permitted("cohort:write", &held));
        assert!(!policy.is_permitted("cohort:delete", &held));
        assert!(!policy.is_permitted("cohort:write", &[]));
    }

    #[test]
    fn disabled_policy_grants_everything() {
        let policy = PermissionPolicy::new(AuthEnforcement::Disabled);
        assert!(policy.is_permitted("cohort:write", &[]));
        assert!(policy.is_permitted("", &[]));
        assert_eq!(policy.enforcement(), AuthEnforcement::Disabled);
    }

    #[test]
    fn enforcement_from_flag() {
        assert_eq!(AuthEnforcement::from_flag(true), AuthEnforcement::Enforced);
        assert_eq!(AuthEnforcement::from_flag(false), AuthEnforcement::Disabled);
        assert_eq!(AuthEnforcement::default(), AuthEnforcement::Enforced);
    }

    #[test]
    fn cache_memoizes_and_resets_on_new_permissions() {
        let cache = PermissionCache::new(PermissionPolicy::enforced());
        let first = grants(&["cohort:read"]);
        assert!(cache.is_permitted("cohort:read", &first));
        assert!(!cache.is_permitted("cohort:write", &first));
        assert_eq!(cache.len(), 2);

        let second = grants(&["cohort:write"]);
        assert!(cache.is_permitted("cohort:write", &second));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
