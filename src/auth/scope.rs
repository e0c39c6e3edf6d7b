// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Scope vocabulary for authorization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What a scope allows the bearer to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
}

/// What a scope applies to.
///
/// `All` is the wildcard resource: `write:all` covers every `write:*` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Item,
    Location,
    Hideout,
    User,
    Statistic,
    Token,
    All,
}

/// A capability grant of the form `action:resource`.
///
/// ## Vocabulary
///
/// `read` and `write` over `item`, `location`, `hideout`, `user`,
/// `statistic` and `token`, plus the wildcards `read:all` and `write:all`.
/// Every combination of [`Action`] and [`Resource`] is a member, so a parsed
/// `Scope` is always part of the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Scope {
    pub action: Action,
    pub resource: Resource,
}

/// Scope parsing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeError {
    #[error("unknown scope: {0}")]
    Unknown(String),
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
        }
    }
}

impl Resource {
    const VARIANTS: [Resource; 7] = [
        Resource::Item,
        Resource::Location,
        Resource::Hideout,
        Resource::User,
        Resource::Statistic,
        Resource::Token,
        Resource::All,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Resource::Item => "item",
            Resource::Location => "location",
            Resource::Hideout => "hideout",
            Resource::User => "user",
            Resource::Statistic => "statistic",
            Resource::Token => "token",
            Resource::All => "all",
        }
    }
}

impl Scope {
    pub const READ_ITEM: Scope = Scope::new(Action::Read, Resource::Item);
    pub const WRITE_ITEM: Scope = Scope::new(Action::Write, Resource::Item);
    pub const READ_LOCATION: Scope = Scope::new(Action::Read, Resource::Location);
    pub const WRITE_LOCATION: Scope = Scope::new(Action::Write, Resource::Location);
    pub const READ_HIDEOUT: Scope = Scope::new(Action::Read, Resource::Hideout);
    pub const WRITE_HIDEOUT: Scope = Scope::new(Action::Write, Resource::Hideout);
    pub const READ_USER: Scope = Scope::new(Action::Read, Resource::User);
    pub const WRITE_USER: Scope = Scope::new(Action::Write, Resource::User);
    pub const READ_STATISTIC: Scope = Scope::new(Action::Read, Resource::Statistic);
    pub const WRITE_STATISTIC: Scope = Scope::new(Action::Write, Resource::Statistic);
    pub const READ_TOKEN: Scope = Scope::new(Action::Read, Resource::Token);
    pub const WRITE_TOKEN: Scope = Scope::new(Action::Write, Resource::Token);
    pub const READ_ALL: Scope = Scope::new(Action::Read, Resource::All);
    pub const WRITE_ALL: Scope = Scope::new(Action::Write, Resource::All);

    pub const fn new(action: Action, resource: Resource) -> Self {
        Self { action, resource }
    }

    /// Every scope in the vocabulary.
    pub fn vocabulary() -> impl Iterator<Item = Scope> {
        [Action::Read, Action::Write]
            .into_iter()
            .flat_map(|action| Resource::VARIANTS.into_iter().map(move |r| Scope::new(action, r)))
    }

    /// Check whether this granted scope satisfies `required`.
    ///
    /// A grant covers the exact scope, or any scope of the same action when
    /// the grant's resource is the wildcard `all`.
    pub fn covers(&self, required: Scope) -> bool {
        *self == required || (self.action == required.action && self.resource == Resource::All)
    }
}

/// Parse a claims scope list, rejecting anything outside the vocabulary.
pub fn parse_scopes<S: AsRef<str>>(scopes: &[S]) -> Result<Vec<Scope>, ScopeError> {
    scopes.iter().map(|s| s.as_ref().parse()).collect()
}

impl FromStr for Scope {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ScopeError::Unknown(s.to_string());
        let (action, resource) = s.split_once(':').ok_or_else(unknown)?;

        let action = match action {
            "read" => Action::Read,
            "write" => Action::Write,
            _ => return Err(unknown()),
        };
        let resource = Resource::VARIANTS
            .into_iter()
            .find(|r| r.as_str() == resource)
            .ok_or_else(unknown)?;

        Ok(Scope::new(action, resource))
    }
}

impl TryFrom<String> for Scope {
    type Error = ScopeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Scope> for String {
    fn from(scope: Scope) -> Self {
        scope.to_string()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.action.as_str(), self.resource.as_str())
    }
}
