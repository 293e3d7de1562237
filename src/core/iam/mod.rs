//! Access resolution for object keys
//!
//! Provides public/private classification over a flat allow-list:
//! - Exact, directory (`dir/`) and single-wildcard (`dir/*.csv`) rules
//! - Any matching rule makes a key public
//! - Keys public through a parent rule cannot be toggled individually
//! - Allow-list editing for "make public" / "make private" actions

mod pattern;
mod policy;

pub use pattern::{PatternKind, PatternMatcher};
pub use policy::{
    can_change_policy, check_is_public, get_policy_attributes, rule_for_key,
    validate_allow_list, Policy, PolicyAttributes, PolicyResolver,
};
