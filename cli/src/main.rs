use clap::Parser;
use colored::*;
use infodesk_core::config::{AssistantConfig, get_default_config_file};
use infodesk_core::feedback::EmailJsClient;
use infodesk_core::{Assistant, ChatSession, FeedbackSubmitter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

mod app;
mod cli;
mod logging;
mod output;
mod view;

use crate::cli::Args;
use crate::logging::init_logging;
use crate::output::{print_error, print_usage_instructions};

const APP_NAME: &str = "infodesk";

fn config_path(args: &Args) -> anyhow::Result<PathBuf> {
    match &args.config {
        Some(path) => Ok(path.clone()),
        None => Ok(get_default_config_file(APP_NAME)?),
    }
}

/// Writes the command-line overrides on top of the existing config file
fn save_config(args: &Args) -> anyhow::Result<PathBuf> {
    let path = config_path(args)?;
    let file = AssistantConfig::load_from_file(&path)?;
    file.merge(&args.overrides()).save_to_file(&path)?;
    Ok(path)
}

/// Layers defaults, config file, environment and command line, in increasing priority
fn load_config(args: &Args) -> anyhow::Result<AssistantConfig> {
    let file = AssistantConfig::load_from_file(&config_path(args)?)?;

    Ok(AssistantConfig::defaults()
        .merge(&file)
        .merge(&AssistantConfig::from_env())
        .merge(&args.overrides()))
}

fn feedback_submitter(config: &AssistantConfig) -> Option<FeedbackSubmitter> {
    let http = match config.http_client() {
        Ok(http) => http,
        Err(e) => {
            warn!(error = %e, "Feedback disabled: HTTP client unavailable");
            return None;
        }
    };
    match EmailJsClient::from_config(config, http) {
        Ok(client) => Some(FeedbackSubmitter::new(Arc::new(client), config)),
        Err(e) => {
            warn!(error = %e, "Feedback disabled");
            None
        }
    }
}

/// Main function - answers one question or runs the chat loop
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Secrets may live in a .env file next to the binary's working directory
    dotenvy::dotenv().ok();

    let args = Args::parse();
    if args.save_config {
        let path = save_config(&args)?;
        println!("Saved configuration to {}", path.display());
        return Ok(());
    }

    let config = load_config(&args)?;
    init_logging(config.log_level.as_deref().unwrap_or("info"));

    let mut session = ChatSession::new(config.locale());
    let feedback = feedback_submitter(&config);

    if let (Some(text), Some(rating)) = (args.feedback.clone(), args.rating) {
        let Some(submitter) = feedback.as_ref() else {
            print_error("Feedback is not configured. Set EMAILJS_KEY to enable it.");
            return Ok(());
        };
        if let Err(e) = app::run_feedback(submitter, &mut session, text, rating).await {
            print_error(&e.to_string());
        }
        return Ok(());
    }

    if !args.interactive && args.prompt.is_none() {
        print_usage_instructions();
        return Ok(());
    }

    let assistant = match Assistant::from_config(&config) {
        Ok(assistant) => assistant,
        Err(e) => {
            eprintln!("{}", format!("Error initializing assistant: {}", e).red());
            return Err(e.into());
        }
    };
    info!(locale = %session.locale(), "Assistant ready");

    if args.interactive {
        if let Err(e) = app::run_interactive_chat(&assistant, feedback.as_ref(), &mut session).await
        {
            print_error(&format!("Interactive chat failed: {}", e));
        }
    } else if let Some(prompt) = args.prompt {
        app::run_single_query(&assistant, &mut session, prompt).await?;
    }

    Ok(())
}
