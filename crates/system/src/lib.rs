//! OS integration used by the command line client.
//!
//! - [`Keyring`]: get/set/delete of secrets by key, backed by the OS
//!   credential store ([`SystemKeyring`]) or memory ([`MemoryKeyring`]).
//! - [`Runtime`]: best-effort launching of the default browser.

pub mod error;
pub mod keyring;
pub mod runtime;

pub use crate::error::KeyringError;
pub use crate::keyring::{Keyring, MemoryKeyring, SystemKeyring};
pub use crate::runtime::{Runtime, SystemRuntime};
