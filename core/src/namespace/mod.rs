//! The global store: hierarchical paths, typed values, and the single
//! critical section every command runs through.

pub mod path;
pub mod store;
pub mod value;

pub use path::{validate, GlobalPath, Namespace};
pub use store::Store;
pub use value::{FromStoreValue, StoreValue};
