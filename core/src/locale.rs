use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::AssistantError;

/// Languages the assistant can be switched to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Fr,
    Rw,
}

/// Static UI strings for one locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translations {
    pub welcome: &'static str,
    pub input_placeholder: &'static str,
    pub send_button: &'static str,
    pub feedback_button: &'static str,
    pub feedback_title: &'static str,
    pub feedback_placeholder: &'static str,
    pub rating_text: &'static str,
    pub submit_feedback: &'static str,
}

const EN: Translations = Translations {
    welcome: "Hello! I'm your MIGEPROF Information Assistant. How can I help you today?",
    input_placeholder: "Type your question here...",
    send_button: "Send",
    feedback_button: "Feedback",
    feedback_title: "Your Feedback",
    feedback_placeholder: "Share your feedback here...",
    rating_text: "Rating:",
    submit_feedback: "Submit Feedback",
};

const FR: Translations = Translations {
    welcome: "Bonjour! Je suis votre assistant d'information MIGEPROF. Comment puis-je vous aider aujourd'hui?",
    input_placeholder: "Tapez votre question ici...",
    send_button: "Envoyer",
    feedback_button: "Commentaires",
    feedback_title: "Vos Commentaires",
    feedback_placeholder: "Partagez vos commentaires ici...",
    rating_text: "Évaluation:",
    submit_feedback: "Soumettre",
};

const RW: Translations = Translations {
    welcome: "Muraho! Ndi umufasha wawe wa MIGEPROF. Ese nakugirira iyihe neza uyu munsi?",
    input_placeholder: "Andika ikibazo cyawe hano...",
    send_button: "Ohereza",
    feedback_button: "Igitekerezo",
    feedback_title: "Igitekerezo Cyawe",
    feedback_placeholder: "Sangiza hano igitekerezo cyawe...",
    rating_text: "Amanota:",
    submit_feedback: "Ohereza Igitekerezo",
};

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Fr, Locale::Rw];

    /// Short code used on the command line and in config files
    pub fn code(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
            Locale::Rw => "rw",
        }
    }

    /// Language name the model is asked to answer in
    pub fn language_name(self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Fr => "French",
            Locale::Rw => "Kinyarwanda",
        }
    }

    pub fn translations(self) -> &'static Translations {
        match self {
            Locale::En => &EN,
            Locale::Fr => &FR,
            Locale::Rw => &RW,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Locale::En),
            "fr" | "french" | "français" => Ok(Locale::Fr),
            "rw" | "kinyarwanda" => Ok(Locale::Rw),
            other => Err(AssistantError::Validation(format!(
                "Unsupported language '{}'. Choose one of: en, fr, rw",
                other
            ))),
        }
    }
}
