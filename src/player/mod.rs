//! Media player: weekday filtering, round-robin rotation and event-driven
//! advancement, driven by periodic catalog refreshes.

mod renderer;
mod rotation;
mod runtime;
mod schedule;
mod scheduler;

pub use runtime::{spawn_player, PlayerHandle};
pub use scheduler::{MediaCatalog, MediaScheduler, NowShowing, PlayerSettings};
