//! Command-line client for privileged-access vault, cloud orchestration and
//! virtualization management APIs.
//!
//! Every API family obtains its session the same way: connection values are
//! settled in a [`session_context::SessionContext`], a credential is found by
//! the [`resolver::CredentialResolver`] and exchanged for a token by the
//! [`connector::SessionConnector`].
//!
//! # Modules
//!
//! - `session_context`: namespaced per-invocation state
//! - `secret`, `keyring`, `dev_keyring`: protected secrets and key storage
//! - `credential`, `credential_file`, `prompt`, `resolver`: finding credentials
//! - `http_utils`, `connector`, `pagination`, `batch`: talking to servers
//! - `vault`, `cloud`, `vsphere`: the API families
//! - `convert`: text conversions
//! - `commands`, `actions`, `cli`: the command line

pub mod actions;
pub mod batch;
pub mod cli;
pub mod cloud;
pub mod commands;
pub mod configuration;
pub mod connector;
pub mod context;
pub mod convert;
pub mod credential;
pub mod credential_file;
pub mod dev_keyring;
pub mod error;
pub mod error_utils;
pub mod exit_codes;
pub mod format;
pub mod http_utils;
pub mod keyring;
pub mod pagination;
pub mod prompt;
pub mod resolver;
pub mod secret;
pub mod session_context;
pub mod vault;
pub mod vsphere;
