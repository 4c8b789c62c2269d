//! tl-core: Document model for Tapeline
//!
//! Tracks, the copy-on-write track collection, selection and view types
//! shared by the history engine and every editing operation.

mod document;
mod error;
mod selection;
mod track;
mod tracks;

pub use document::*;
pub use error::*;
pub use selection::*;
pub use track::*;
pub use tracks::*;
