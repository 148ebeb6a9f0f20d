//! Core of the infodesk assistant: deciding when to fetch context, gathering it from the
//! document repository and web search, assembling the prompt and streaming the answer.

pub mod classifier;
pub use classifier::should_retrieve;

pub mod completion;
pub use completion::{CompletionBackend, CompletionClient};

pub mod config;
pub use config::*;

pub mod context;
pub use context::{ContextBundle, ContextGatherer, DocumentRepository, WebSearch};

pub mod errors;
pub use errors::*;

pub mod feedback;
pub use feedback::{EmailSender, FeedbackForm, FeedbackSubmitter};

pub mod locale;
pub use locale::{Locale, Translations};

pub mod orchestrator;
pub use orchestrator::{Assistant, ChatView, Indicator, APOLOGY};

pub mod prompt;
pub use prompt::{assemble, PromptEnvelope};

pub mod session;
pub use session::{ChatSession, Conversation};

pub mod stream;
pub use stream::{decode_fragments, FragmentStream};

pub mod types;
