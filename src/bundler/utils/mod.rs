//! Shared helpers: filesystem operations and re-entrant byte streams.

pub mod fs;
pub mod stream;

pub use stream::ReplayStream;
