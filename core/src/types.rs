use serde::{Deserialize, Serialize};

/// Role of a chat message sent to the completion endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single chat message in a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request body for a streamed chat completion
#[derive(Serialize, Debug)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<&'a ChatMessage>,
    pub temperature: f32,
    pub stream: bool,
}

/// One `data:` payload of a streamed completion
#[derive(Deserialize, Debug)]
pub struct CompletionChunk {
    pub choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Deserialize, Debug, Default)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionChunk {
    /// Text carried by the first choice, if any
    pub fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.delta.content)
    }
}

/// Entry of a repository contents listing
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RepoEntry {
    pub name: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// Web search response
#[derive(Deserialize, Debug, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Template parameters of the feedback email
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FeedbackTemplateParams {
    pub to_name: String,
    pub from_name: String,
    pub message: String,
    pub to_email: String,
    pub timestamp: String,
}

/// Request body of a template-based email send
#[derive(Serialize, Debug)]
pub struct EmailSendRequest<'a> {
    pub service_id: &'a str,
    pub template_id: &'a str,
    pub user_id: &'a str,
    pub template_params: &'a FeedbackTemplateParams,
}
