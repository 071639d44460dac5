//! Local storage layer.

pub mod store;

pub use store::LocalStore;
