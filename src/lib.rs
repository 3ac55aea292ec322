//! projgrant - Project authorization resolver
//!
//! Callers are granted project roles through their identity groups. A decision is
//! made per request from three inputs:
//! - the caller's groups (claims, or a best-effort identity service lookup)
//! - the most privileged role those groups hold on the project
//! - the read policy (`all_authenticated` or `groups_only`)
//!
//! Storage pattern: `project/group` -> role name, mirrored as `group/project`.

pub mod authorizer;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod gate;
pub mod groups;
pub mod permission;
pub mod policy;
pub mod principal;
pub mod read;
pub mod role;
pub mod tx;
pub mod write;

#[cfg(feature = "server")]
pub mod server;

pub use authorizer::Authorizer;
pub use config::Config;
pub use db::{clear_all, init, test_lock};
pub use error::{Error, Result};
pub use gate::AuthorizationDecision;
pub use groups::{
    resolve_groups, GroupDirectory, GroupLookup, GroupResolution, GroupSet, IdentityClient, LookupFailure,
};
pub use permission::Permission;
pub use policy::{PolicySource, ReadPolicy};
pub use principal::Principal;
pub use read::{get_grant, list_for_group, list_for_project, Grant, GrantSource, LmdbGrants};
pub use role::Role;
pub use tx::{transact, Tx};
