//! Data models for the signage backend.
//!
//! Wire format is camelCase JSON, the shape the player and admin pages consume.

mod client;
mod folder;
mod media;
mod settings;

pub use client::*;
pub use folder::*;
pub use media::*;
pub use settings::*;

#[cfg(test)]
pub(crate) use media::fixtures;
