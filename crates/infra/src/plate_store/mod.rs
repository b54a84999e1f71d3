//! Plate persistence boundary.
//!
//! The catalog engine only talks to [`PlateStore`]; backends decide how plates
//! and audit entries are kept, as long as a commit stays atomic and
//! version-checked.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryPlateStore;
pub use r#trait::{PlateStore, StoreError};
