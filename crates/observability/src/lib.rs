//! Process-wide logging setup shared by the binaries.

pub mod logging;

pub use logging::{DEFAULT_DIRECTIVE, init, init_with_default};
