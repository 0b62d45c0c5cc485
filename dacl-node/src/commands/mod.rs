//! CLI command implementations

pub mod acl;
