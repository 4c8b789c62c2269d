//! tl-state: Document history, undo/redo and the project session
//!
//! Records document states as shared track references, travels between
//! them, and hosts the track and selection operations that produce them.

mod autosave;
mod commands;
mod focus;
mod history;
mod observer;
mod project;
mod settings;
mod snapshot;
mod undo;

pub use autosave::*;
pub use commands::*;
pub use focus::*;
pub use history::*;
pub use observer::*;
pub use project::*;
pub use settings::*;
pub use snapshot::*;
pub use undo::*;
