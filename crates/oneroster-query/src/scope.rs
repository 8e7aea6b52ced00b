//! OneRoster 1.2 OAuth scopes.
//!
//! Token verification happens upstream; this module only decides whether a
//! verified scope set grants access to a resource.

use std::collections::HashSet;

use crate::endpoint::ResourceKind;

pub const ROSTER_READONLY: &str = "https://purl.imsglobal.org/spec/or/v1p2/scope/roster.readonly";
pub const ROSTER_CORE_READONLY: &str =
    "https://purl.imsglobal.org/spec/or/v1p2/scope/roster-core.readonly";
pub const ROSTER_DEMOGRAPHICS_READONLY: &str =
    "https://purl.imsglobal.org/spec/or/v1p2/scope/roster-demographics.readonly";

/// The narrow scope that grants read access to `resource`.
#[must_use]
pub fn required_scope(resource: ResourceKind) -> &'static str {
    match resource {
        ResourceKind::Demographics => ROSTER_DEMOGRAPHICS_READONLY,
        _ => ROSTER_CORE_READONLY,
    }
}

/// Client-facing message for a rejected request.
#[must_use]
pub fn insufficient_scope_message(resource: ResourceKind) -> String {
    format!(
        "Insufficient scope: your token must have the '{ROSTER_READONLY}' or '{}' scope to access this route.",
        required_scope(resource)
    )
}

/// Scopes carried by a verified access token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantedScopes(HashSet<String>);

impl GrantedScopes {
    /// Parses a space-delimited OAuth `scope` claim.
    #[must_use]
    pub fn from_claim(claim: &str) -> Self {
        claim.split_whitespace().map(String::from).collect()
    }

    #[must_use]
    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    /// `roster.readonly` grants everything; otherwise the resource's narrow scope is needed.
    #[must_use]
    pub fn allows(&self, resource: ResourceKind) -> bool {
        self.contains(ROSTER_READONLY) || self.contains(required_scope(resource))
    }
}

impl FromIterator<String> for GrantedScopes {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
