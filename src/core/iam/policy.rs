//! Public/private access resolution over an allow-list
//!
//! An object is public when any allow-list rule matches its key. Whether the
//! user may toggle that status depends on where it comes from: a rule naming
//! the key can be removed, a rule covering a parent directory cannot be edited
//! from the child.

use super::PatternMatcher;
use crate::error::{AccessError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Visibility of an object key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Readable without credentials
    Public,
    /// Readable by the owner only
    Private,
}

/// Visibility of a key together with whether it can be edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyAttributes {
    pub policy: Policy,
    pub can_change_policy: bool,
}

/// True iff any rule matches `key`
pub fn check_is_public<S: AsRef<str>>(allow_list: &[S], key: &str) -> bool {
    allow_list
        .iter()
        .any(|pattern| PatternMatcher::matches(pattern.as_ref(), key))
}

/// True when `key` is public through a rule covering one of its parents
///
/// Rules equal to `key` or to `key*` name the key itself and are not counted.
fn is_under_public_parent<S: AsRef<str>>(allow_list: &[S], key: &str) -> bool {
    allow_list.iter().map(AsRef::as_ref).any(|pattern| {
        pattern != key
            && pattern.strip_suffix('*') != Some(key)
            && PatternMatcher::matches_inherited(pattern, key)
    })
}

/// Whether the policy of `key` may be toggled individually
pub fn can_change_policy<S: AsRef<str>>(allow_list: &[S], key: &str) -> bool {
    !is_under_public_parent(allow_list, key)
}

/// Resolve visibility and editability of `key`
pub fn get_policy_attributes<S: AsRef<str>>(allow_list: &[S], key: &str) -> PolicyAttributes {
    if !check_is_public(allow_list, key) {
        return PolicyAttributes {
            policy: Policy::Private,
            can_change_policy: true,
        };
    }

    PolicyAttributes {
        policy: Policy::Public,
        can_change_policy: can_change_policy(allow_list, key),
    }
}

/// Check every rule of an allow-list
pub fn validate_allow_list<S: AsRef<str>>(allow_list: &[S]) -> Result<()> {
    allow_list
        .iter()
        .try_for_each(|pattern| PatternMatcher::validate(pattern.as_ref()))
}

/// Rule that names `key` itself
///
/// Directory keys (ending with `/`) are published as `key*` so the rule covers
/// their content.
pub fn rule_for_key(key: &str) -> String {
    if key.ends_with('/') {
        format!("{}*", key)
    } else {
        key.to_string()
    }
}

/// Allow-list of a bucket with the resolution operations attached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyResolver {
    allow_list: Vec<String>,
}

impl PolicyResolver {
    /// Create a resolver, rejecting structurally invalid rules
    pub fn new<I, S>(allow_list: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allow_list: Vec<String> = allow_list.into_iter().map(Into::into).collect();
        validate_allow_list(&allow_list)?;
        Ok(PolicyResolver { allow_list })
    }

    /// Current rules
    pub fn allow_list(&self) -> &[String] {
        &self.allow_list
    }

    pub fn into_allow_list(self) -> Vec<String> {
        self.allow_list
    }

    pub fn check_is_public(&self, key: &str) -> bool {
        check_is_public(&self.allow_list, key)
    }

    pub fn can_change_policy(&self, key: &str) -> bool {
        can_change_policy(&self.allow_list, key)
    }

    pub fn get_policy_attributes(&self, key: &str) -> PolicyAttributes {
        get_policy_attributes(&self.allow_list, key)
    }

    /// Make `key` public or private by editing the rules that name it
    ///
    /// # Errors
    ///
    /// `PolicyNotChangeable` when the key is public through a parent rule, and
    /// `InvalidAllowListPattern` when the key cannot be written as a rule. Keys
    /// containing `*` are refused since their rule would read as a wildcard.
    pub fn set_policy(&mut self, key: &str, policy: Policy) -> Result<()> {
        if key.contains('*') {
            return Err(AccessError::invalid_pattern(
                key,
                "keys containing * cannot be written as an exact rule",
            ));
        }
        if !self.can_change_policy(key) {
            return Err(AccessError::PolicyNotChangeable(key.to_string()));
        }

        let rule = rule_for_key(key);
        PatternMatcher::validate(&rule)?;

        match policy {
            Policy::Public => {
                if !self.allow_list.iter().any(|p| *p == rule) {
                    debug!("Adding allow-list rule: {}", rule);
                    self.allow_list.push(rule);
                }
            }
            Policy::Private => {
                // Rules naming the key: the key itself and `key*`
                let self_wildcard = format!("{}*", key);
                let before = self.allow_list.len();
                self.allow_list.retain(|p| p != key && *p != self_wildcard);
                debug!(
                    "Removed {} allow-list rule(s) for {}",
                    before - self.allow_list.len(),
                    key
                );
            }
        }

        Ok(())
    }
}
