//! Per-user chat state: language, feedback panel and the displayed conversation.

use chrono::{DateTime, Local};

use crate::feedback::FeedbackForm;
use crate::locale::{Locale, Translations};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub sender: Sender,
    pub text: String,
    pub at: DateTime<Local>,
}

/// Messages shown to the user in this process; never persisted or sent to the model
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    entries: Vec<ConversationEntry>,
}

impl Conversation {
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.push(Sender::User, text.into());
    }

    pub fn push_bot(&mut self, text: impl Into<String>) {
        self.push(Sender::Bot, text.into());
    }

    fn push(&mut self, sender: Sender, text: String) {
        self.entries.push(ConversationEntry {
            sender,
            text,
            at: Local::now(),
        });
    }
}

/// Everything that used to be page-global state, owned by one session
#[derive(Debug, Clone)]
pub struct ChatSession {
    locale: Locale,
    placeholder: String,
    pub feedback: FeedbackForm,
    pub conversation: Conversation,
}

impl ChatSession {
    /// Starts a session whose conversation opens with the localized welcome message
    pub fn new(locale: Locale) -> Self {
        let mut conversation = Conversation::default();
        conversation.push_bot(locale.translations().welcome);
        Self {
            locale,
            placeholder: locale.translations().input_placeholder.to_string(),
            feedback: FeedbackForm::default(),
            conversation,
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn translations(&self) -> &'static Translations {
        self.locale.translations()
    }

    /// Current hint shown in the input line
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Switches language, re-translating the welcome message and the input hint
    pub fn change_language(&mut self, locale: Locale) -> &'static Translations {
        self.locale = locale;
        let strings = locale.translations();
        if let Some(welcome) = self
            .conversation
            .entries
            .iter_mut()
            .find(|e| e.sender == Sender::Bot)
        {
            welcome.text = strings.welcome.to_string();
        }
        self.placeholder = strings.input_placeholder.to_string();
        strings
    }

    /// Jumps to a topic: the bot invites a question about it and the input hint follows
    pub fn select_topic(&mut self, topic: &str) -> &str {
        self.conversation
            .push_bot(format!("What would you like to know about {}?", topic));
        self.placeholder = format!("Ask your question about {}...", topic);
        &self.placeholder
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}
