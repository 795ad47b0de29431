//! PM33 mapping event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`MappingEvent`]: the event envelope published after every session
//!   mutation so a presentation layer can re-render.

pub mod bus;

pub use bus::{EventBus, MappingEvent};
