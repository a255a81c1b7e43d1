//! Prompt context enrichment
//!
//! Two optional text blocks can be added to a prompt before rendering:
//!
//! - `external_context`: snippets from bibliographic search services,
//!   combined by [`ExternalContext`] and cached per query and language
//! - `feedback_context`: a short summary of learner feedback on a lesson,
//!   produced by [`FeedbackSummarizer`]
//!
//! Neither block ever fails a generation. Unavailable sources contribute
//! empty text and are logged.

pub mod cache;
pub mod enricher;
mod error;
pub mod feedback;
pub mod search;

pub use cache::{ContextCache, ContextKey};
pub use enricher::ExternalContext;
pub use error::{ContextError, Result};
pub use feedback::{Feedback, FeedbackStore, FeedbackSummarizer, InMemoryFeedbackStore, summarize};
pub use search::{
    ArxivClient, CrossrefClient, ExternalSearch, OpenAlexClient, SearchSource, SourceSelection,
};
