//! Declarative resource access policies.
//!
//! Each resource is described once by a static [`ResourcePolicy`]: its
//! columns, how a row is tied back to the client that owns it, how it is
//! deleted, and which role may do what to which rows. The statement
//! builders in [`builder`] interpret these tables, so every handler shares
//! the same authorization and SQL construction path.

pub mod builder;
pub mod fields;
pub mod tables;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::database::statement::StatementError;
use crate::types::{Action, Role};

pub use builder::Selector;
pub use fields::{FieldDef, FieldKind};
pub use tables::{ATHLETES, CLIENTS, ENROLLMENTS, PAYMENTS, TOURNAMENTS};

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("role {role} may not {action} {resource}")]
    Forbidden {
        role: Role,
        action: Action,
        resource: &'static str,
    },

    #[error("{0} belongs to another client")]
    NotOwner(&'static str),

    #[error("no valid fields for role")]
    NoWritableFields,

    #[error("fields not writable for role: {}", .0.join(", "))]
    FieldsNotWritable(Vec<String>),

    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    #[error("invalid field format")]
    InvalidFields(BTreeMap<String, String>),

    #[error(transparent)]
    Statement(#[from] StatementError),
}

/// How a row resolves to the client who owns it
#[derive(Debug, Clone, Copy)]
pub enum OwnerPath {
    /// Nobody owns these rows
    Unowned,
    /// A column of the row itself holds the owner id
    Direct(&'static str),
    /// The row references a parent row that holds the owner id
    Through {
        noun: &'static str,
        fk: &'static str,
        table: &'static str,
        owner: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    Hard,
    /// Flip a boolean column instead of removing the row
    Toggle(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    Owned,
}

#[derive(Debug, Clone, Copy)]
pub enum FieldSet {
    All,
    Only(&'static [&'static str]),
}

impl FieldSet {
    pub fn contains(&self, field: &str) -> bool {
        match self {
            FieldSet::All => true,
            FieldSet::Only(names) => names.iter().any(|n| *n == field),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Grant {
    pub role: Role,
    pub scope: Scope,
    pub writable: FieldSet,
}

impl Grant {
    pub const fn any(role: Role) -> Self {
        Self { role, scope: Scope::Any, writable: FieldSet::All }
    }

    pub const fn owned(role: Role) -> Self {
        Self { role, scope: Scope::Owned, writable: FieldSet::All }
    }

    pub const fn writing(mut self, fields: &'static [&'static str]) -> Self {
        self.writable = FieldSet::Only(fields);
        self
    }
}

/// Row source and projection used for reads
#[derive(Debug, Clone, Copy)]
pub struct ReadView {
    pub columns: &'static str,
    pub joins: &'static str,
    /// Listing order, over the projected column names
    pub order_by: &'static str,
    /// Extra condition applied to listings only
    pub list_filter: Option<&'static str>,
}

#[derive(Debug)]
pub struct ResourcePolicy {
    /// Singular noun used in messages
    pub name: &'static str,
    pub table: &'static str,
    pub fields: &'static [FieldDef],
    pub owner: OwnerPath,
    /// Column bound to the parent id of nested routes
    pub parent: Option<&'static str>,
    pub delete_mode: DeleteMode,
    pub view: ReadView,
    pub create: &'static [Grant],
    pub read: &'static [Grant],
    pub update: &'static [Grant],
    pub delete: &'static [Grant],
}

impl ResourcePolicy {
    fn grants(&self, action: Action) -> &'static [Grant] {
        match action {
            Action::Create => self.create,
            Action::Read => self.read,
            Action::Update => self.update,
            Action::Delete => self.delete,
        }
    }

    /// The grant for `(action, role)`, or Forbidden when there is none
    pub fn grant(&self, action: Action, role: Role) -> Result<&'static Grant, PolicyError> {
        self.grants(action)
            .iter()
            .find(|g| g.role == role)
            .ok_or(PolicyError::Forbidden {
                role,
                action,
                resource: self.name,
            })
    }

    /// Roles holding any grant for `action`; this is what the guard admits
    pub fn allowed_roles(&self, action: Action) -> Vec<Role> {
        self.grants(action).iter().map(|g| g.role).collect()
    }

    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_lookup_and_allowed_roles() {
        assert!(TOURNAMENTS.grant(Action::Read, Role::Client).is_ok());
        assert!(matches!(
            TOURNAMENTS.grant(Action::Create, Role::Client),
            Err(PolicyError::Forbidden { role: Role::Client, action: Action::Create, .. })
        ));
        assert_eq!(
            TOURNAMENTS.allowed_roles(Action::Update),
            vec![Role::Administrator, Role::SuperUser]
        );
        assert_eq!(ATHLETES.allowed_roles(Action::Delete), Role::ALL.to_vec());
    }

    #[test]
    fn client_athlete_updates_are_limited() {
        let grant = ATHLETES.grant(Action::Update, Role::Client).unwrap();
        assert_eq!(grant.scope, Scope::Owned);
        assert!(grant.writable.contains("weight"));
        assert!(!grant.writable.contains("name"));

        let grant = ATHLETES.grant(Action::Update, Role::Administrator).unwrap();
        assert!(grant.writable.contains("name"));
    }

    #[test]
    fn forbidden_message_names_resource() {
        let err = PAYMENTS.grant(Action::Create, Role::Client).unwrap_err();
        assert_eq!(err.to_string(), "role Client may not create payment");
    }

    #[test]
    fn every_grant_field_exists() {
        for policy in [&ATHLETES, &TOURNAMENTS, &ENROLLMENTS, &PAYMENTS, &CLIENTS] {
            for action in [Action::Create, Action::Read, Action::Update, Action::Delete] {
                for grant in policy.grants(action) {
                    if let FieldSet::Only(names) = grant.writable {
                        for name in names {
                            assert!(policy.field(name).is_some(), "{}.{}", policy.table, name);
                        }
                    }
                }
            }
        }
    }
}
