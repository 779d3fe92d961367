//! Quote recall: reaction-weighted sampling of a user's past messages.

pub mod cache;
pub mod engine;
pub mod filter;
pub mod render;
pub mod sampler;
pub mod selection;
pub mod types;

pub use cache::{CacheRegistry, ChannelCache};
pub use engine::{Quote, QuoteEngine, QuoteRequest};
pub use render::QuoteCard;
pub use selection::{CandidateSet, Selection};
pub use types::{Attachment, Author, ChannelInfo, ChannelKind, HistoryQuery, Message, Reaction};
