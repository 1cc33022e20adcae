//! Brigade kernel: a MUMPS-style global store for a kitchen production
//! floor, with a reactive load score, guard policies, a sealed task archive,
//! and hashed exports.

pub mod clock;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod export;
pub mod guard;
pub mod kernel;
pub mod namespace;
pub mod score;
pub mod task;

pub use config::KernelConfig;
pub use error::KernelError;
pub use kernel::{BrigadeMember, Kernel};
