//! Star-rating feedback and its delivery through a transactional email service.

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::config::{AssistantConfig, DEFAULT_EMAIL_ENDPOINT};
use crate::errors::{AssistantError, AssistantResult};
use crate::session::Conversation;
use crate::types::{EmailSendRequest, FeedbackTemplateParams};

pub const MAX_RATING: u8 = 5;
pub const MISSING_FEEDBACK: &str = "Please provide both feedback and rating";
pub const FEEDBACK_SENT: &str = "Feedback sent successfully!";
pub const THANK_YOU: &str =
    "Thank you for your feedback! We appreciate your input to help improve our service.";

/// Editable state of the feedback panel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackForm {
    text: String,
    rating: u8,
    visible: bool,
}

impl FeedbackForm {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    /// Sets the star rating; 0 clears it
    pub fn set_rating(&mut self, rating: u8) -> AssistantResult<()> {
        if rating > MAX_RATING {
            return Err(AssistantError::Validation(format!(
                "Rating must be between 1 and {}",
                MAX_RATING
            )));
        }
        self.rating = rating;
        Ok(())
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Checks both fields are filled and freezes them into a record
    pub fn validate(&self) -> AssistantResult<FeedbackRecord> {
        if self.text.trim().is_empty() || self.rating == 0 {
            return Err(AssistantError::Validation(MISSING_FEEDBACK.to_string()));
        }
        Ok(FeedbackRecord {
            rating: self.rating,
            text: self.text.clone(),
            timestamp: Local::now(),
        })
    }
}

/// Feedback as submitted; sent once and discarded
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub rating: u8,
    pub text: String,
    pub timestamp: DateTime<Local>,
}

impl FeedbackRecord {
    pub fn message(&self) -> String {
        format!("Feedback: {}\nRating: {}/{}", self.text, self.rating, MAX_RATING)
    }
}

/// Status and body returned by the email service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReceipt {
    pub status: u16,
    pub text: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, params: &FeedbackTemplateParams) -> AssistantResult<EmailReceipt>;
}

/// EmailJS REST client
#[derive(Debug, Clone)]
pub struct EmailJsClient {
    client: Client,
    endpoint: String,
    service_id: String,
    template_id: String,
    user_id: String,
}

impl EmailJsClient {
    pub fn from_config(config: &AssistantConfig, client: Client) -> AssistantResult<Self> {
        let required = |value: &Option<String>, what: &str| {
            value
                .clone()
                .ok_or_else(|| AssistantError::ConfigError(format!("{} is not configured", what)))
        };

        Ok(Self {
            client,
            endpoint: config
                .email_endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_EMAIL_ENDPOINT.to_string()),
            service_id: required(&config.email_service_id, "Email service id")?,
            template_id: required(&config.email_template_id, "Email template id")?,
            user_id: required(&config.email_init_key, "Email service key")?,
        })
    }
}

#[async_trait]
impl EmailSender for EmailJsClient {
    async fn send(&self, params: &FeedbackTemplateParams) -> AssistantResult<EmailReceipt> {
        let body = EmailSendRequest {
            service_id: &self.service_id,
            template_id: &self.template_id,
            user_id: &self.user_id,
            template_params: params,
        };

        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        Ok(EmailReceipt { status, text })
    }
}

/// Validates and sends feedback, updating the form and conversation on success
#[derive(Clone)]
pub struct FeedbackSubmitter {
    sender: Arc<dyn EmailSender>,
    to_name: String,
    from_name: String,
    to_email: String,
}

impl FeedbackSubmitter {
    pub fn new(sender: Arc<dyn EmailSender>, config: &AssistantConfig) -> Self {
        Self {
            sender,
            to_name: config.feedback_to_name.clone().unwrap_or_default(),
            from_name: config.feedback_from_name.clone().unwrap_or_default(),
            to_email: config.feedback_to_email.clone().unwrap_or_default(),
        }
    }

    pub fn template_params(&self, record: &FeedbackRecord) -> FeedbackTemplateParams {
        FeedbackTemplateParams {
            to_name: self.to_name.clone(),
            from_name: self.from_name.clone(),
            message: record.message(),
            to_email: self.to_email.clone(),
            timestamp: record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    /// Sends the form's feedback once.
    ///
    /// Invalid input is rejected without touching the network. On failure the form is left as
    /// it was so the user can retry.
    #[instrument(skip_all, fields(rating = form.rating()))]
    pub async fn submit(
        &self,
        form: &mut FeedbackForm,
        conversation: &mut Conversation,
    ) -> AssistantResult<()> {
        let record = form.validate()?;
        let params = self.template_params(&record);

        match self.sender.send(&params).await {
            Ok(receipt) if receipt.status == 200 => {
                info!("Feedback delivered");
                form.reset();
                conversation.push_bot(THANK_YOU);
                Ok(())
            }
            Ok(receipt) => {
                error!(status = receipt.status, body = %receipt.text, "Feedback rejected");
                let detail = Some(receipt.text).filter(|t| !t.trim().is_empty());
                Err(AssistantError::Feedback(detail))
            }
            Err(e) => {
                error!(error = %e, "Feedback submission error");
                let detail = match e {
                    AssistantError::HttpError { message, .. } if !message.is_empty() => {
                        Some(message)
                    }
                    _ => None,
                };
                Err(AssistantError::Feedback(detail))
            }
        }
    }
}
