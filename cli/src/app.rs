use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use infodesk_core::feedback::FEEDBACK_SENT;
use infodesk_core::{Assistant, AssistantError, ChatSession, FeedbackSubmitter, Locale};
use std::io::{self, Write};
use tracing::{debug, error, info};

use crate::output::{
    print_chat_commands, print_entry, print_error, print_notice, stars,
};
use crate::view::TerminalView;

/// A line typed in interactive mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    Lang(String),
    Topic(String),
    Rate(String),
    Feedback,
    CloseFeedback,
    Voice,
    Help,
    Exit,
    Empty,
}

impl ChatCommand {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Self::Empty;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            return Self::Exit;
        }
        let Some(command) = input.strip_prefix('/') else {
            return Self::Ask(input.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim().to_string()),
            None => (command, String::new()),
        };
        match name.to_lowercase().as_str() {
            "lang" => Self::Lang(arg),
            "topic" => Self::Topic(arg),
            "rate" => Self::Rate(arg),
            "feedback" if arg.eq_ignore_ascii_case("close") => Self::CloseFeedback,
            "feedback" => Self::Feedback,
            "voice" => Self::Voice,
            "help" => Self::Help,
            "exit" | "quit" => Self::Exit,
            _ => Self::Ask(input.to_string()),
        }
    }
}

/// Asks one question and streams the answer to stdout
pub async fn run_single_query(
    assistant: &Assistant,
    session: &mut ChatSession,
    prompt: String,
) -> Result<()> {
    info!("Running single query");
    let mut view = TerminalView::stdout();
    let answer = assistant.respond(session, &prompt, &mut view).await;
    view.finish_answer(answer.as_deref());
    Ok(())
}

/// Sends feedback given on the command line
pub async fn run_feedback(
    submitter: &FeedbackSubmitter,
    session: &mut ChatSession,
    text: String,
    rating: u8,
) -> Result<()> {
    session.feedback.set_text(text);
    session.feedback.set_rating(rating)?;
    submitter
        .submit(&mut session.feedback, &mut session.conversation)
        .await?;
    print_notice(FEEDBACK_SENT);
    if let Some(entry) = session.conversation.entries().last() {
        print_entry(entry);
    }
    Ok(())
}

/// Runs an interactive chat session
pub async fn run_interactive_chat(
    assistant: &Assistant,
    feedback: Option<&FeedbackSubmitter>,
    session: &mut ChatSession,
) -> Result<()> {
    if let Some(welcome) = session.conversation.entries().first() {
        print_entry(welcome);
    }
    print_chat_commands(session.translations());
    println!();

    loop {
        println!("{}", session.placeholder().dimmed());
        print!("{}: ", "You".green().bold());
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        let read = io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }

        match ChatCommand::parse(&input) {
            ChatCommand::Empty => continue,
            ChatCommand::Exit => {
                println!("Exiting chat session.");
                break;
            }
            ChatCommand::Help => print_chat_commands(session.translations()),
            ChatCommand::Lang(code) => match code.parse::<Locale>() {
                Ok(locale) => {
                    let strings = session.change_language(locale);
                    debug!(locale = %locale, "Language changed");
                    println!("{}", strings.welcome.blue());
                }
                Err(e) => print_error(&e.to_string()),
            },
            ChatCommand::Topic(topic) if topic.is_empty() => {
                print_error("Usage: /topic <name>");
            }
            ChatCommand::Topic(topic) => {
                session.select_topic(&topic);
                if let Some(entry) = session.conversation.entries().last() {
                    print_entry(entry);
                }
            }
            ChatCommand::Rate(value) => match value.parse::<u8>() {
                Ok(rating) => match session.feedback.set_rating(rating) {
                    Ok(()) => println!(
                        "{} {}",
                        session.translations().rating_text,
                        stars(rating).yellow()
                    ),
                    Err(e) => print_error(&e.to_string()),
                },
                Err(_) => print_error("Usage: /rate <1-5>"),
            },
            ChatCommand::Feedback => {
                if !session.feedback.is_visible() {
                    session.feedback.toggle();
                }
                match feedback {
                    Some(submitter) => feedback_panel(submitter, session).await?,
                    None => print_error(
                        "Feedback is not configured. Set EMAILJS_KEY to enable it.",
                    ),
                }
            }
            ChatCommand::CloseFeedback => {
                if session.feedback.is_visible() {
                    session.feedback.toggle();
                }
            }
            ChatCommand::Voice => {
                print_notice("Voice input is not available in this terminal.");
            }
            ChatCommand::Ask(question) => {
                let mut view = TerminalView::stdout();
                let answer = assistant.respond(session, &question, &mut view).await;
                view.finish_answer(answer.as_deref());
            }
        }

        println!(); // Add spacing between interactions
    }

    Ok(())
}

/// Collects rating and text, then submits. The form keeps its values when sending fails.
async fn feedback_panel(submitter: &FeedbackSubmitter, session: &mut ChatSession) -> Result<()> {
    let strings = session.translations();
    println!("{}", strings.feedback_title.bold());

    let theme = ColorfulTheme::default();
    let choices: Vec<String> = (1..=5u8).map(stars).collect();
    let current = session.feedback.rating().saturating_sub(1) as usize;
    let picked = Select::with_theme(&theme)
        .with_prompt(strings.rating_text)
        .items(&choices)
        .default(current)
        .interact()
        .context("Failed to read rating")?;
    session.feedback.set_rating(picked as u8 + 1)?;

    let text: String = Input::with_theme(&theme)
        .with_prompt(strings.feedback_placeholder)
        .with_initial_text(session.feedback.text())
        .allow_empty(true)
        .interact_text()
        .context("Failed to read feedback")?;
    session.feedback.set_text(text);

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message("Sending...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(120));
    let result = submitter
        .submit(&mut session.feedback, &mut session.conversation)
        .await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            print_notice(FEEDBACK_SENT);
            if let Some(entry) = session.conversation.entries().last() {
                print_entry(entry);
            }
        }
        Err(e @ AssistantError::Validation(_)) => print_error(&e.to_string()),
        Err(e) => {
            error!(error = %e, "Feedback submission failed");
            print_error(&e.to_string());
            println!("{}", "Run /feedback again to retry.".dimmed());
        }
    }
    Ok(())
}
