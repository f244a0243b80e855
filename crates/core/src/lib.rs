//! Players form logic. Keep this crate free of IO and platform concerns;
//! everything the editor host provides comes in through the traits in `host`.

pub mod error;
pub mod host;
pub mod modal;
pub mod player;
pub mod plugin;
pub mod suggest;

pub use error::*;
pub use host::*;
pub use modal::*;
pub use player::*;
pub use plugin::*;
pub use suggest::*;
