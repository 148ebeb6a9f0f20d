use crate::locale::Locale;
use crate::types::ChatMessage;

/// System and user messages for one completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEnvelope {
    pub system: ChatMessage,
    pub user: ChatMessage,
}

impl PromptEnvelope {
    pub fn messages(&self) -> Vec<&ChatMessage> {
        vec![&self.system, &self.user]
    }
}

/// Builds the prompt for a query. `context` is empty when retrieval was skipped or found nothing.
pub fn assemble(persona: &str, context: &str, locale: Locale, query: &str) -> PromptEnvelope {
    let system = format!(
        "{} Context: {}. Please respond in {}.",
        persona,
        context,
        locale.language_name()
    );
    PromptEnvelope {
        system: ChatMessage::system(system),
        user: ChatMessage::user(query),
    }
}
