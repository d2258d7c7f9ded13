//! Download engine contract
//!
//! The extension downloads API performs no transfer itself. Everything that
//! touches the network or the disk lives behind [`DownloadEngine`] and
//! [`EngineSession`]; this crate defines that seam and ships
//! [`MemoryEngine`], an in-process engine with no I/O.

mod engine;
mod error;
mod memory;
mod session;

pub use engine::{DownloadEngine, SessionRequest, SessionView, ViewId};
pub use error::EngineError;
pub use memory::{MemoryEngine, MemorySession};
pub use session::{EngineSession, SessionId, SessionSnapshot};

pub type Result<T> = std::result::Result<T, EngineError>;
