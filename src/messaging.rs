//! Chat platform adapters (Discord, in-memory).

pub mod discord;
pub mod memory;
pub mod traits;

pub use memory::InMemoryPlatform;
pub use traits::{ChatPlatform, Embed};
