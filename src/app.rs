//! Application module: exposes the app model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model` and holds the library, the cursors
//! and the views of the playback state published by the audio thread.

mod model;

pub use model::*;
