//! Track catalog: scans a music directory into read-only `Track` values.
//!
//! The playback core never mutates or persists tracks; it only reads their
//! identity, authoritative duration and audio locator.

mod display;
mod model;
mod scan;

pub use display::{DisplayParts, compose};
pub use model::*;
pub use scan::scan;
