use chrono::{DateTime, Local};
use colored::*;
use infodesk_core::session::{ConversationEntry, Sender};
use infodesk_core::Translations;
use pulldown_cmark::{Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag};

pub const BOT_NAME: &str = "MIGEPROF AI";

fn header(sender: Sender, at: &DateTime<Local>) -> String {
    let time = at.format("%H:%M:%S").to_string();
    match sender {
        Sender::User => format!("{} {}", "You".green().bold(), time.dimmed()),
        Sender::Bot => format!("{} {}", BOT_NAME.blue().bold(), time.dimmed()),
    }
}

/// Print one conversation entry with its sender and time
pub fn print_entry(entry: &ConversationEntry) {
    println!("{}", header(entry.sender, &entry.at));
    match entry.sender {
        Sender::User => println!("{}", entry.text),
        Sender::Bot => println!("{}", render_markdown(&entry.text).trim_end()),
    }
}

/// Header written before a streamed answer
pub fn answer_header() -> String {
    header(Sender::Bot, &Local::now())
}

pub fn print_notice(message: &str) {
    println!("{}", message.cyan());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}

/// Show usage instructions when no prompt or action is provided
pub fn print_usage_instructions() {
    println!("{}", "Usage:".yellow().bold());
    println!("  {}", "infodesk \"your question\"".green().bold());
    println!("    Ask a single question");
    println!();
    println!("  {}", "infodesk -i".green().bold());
    println!("    Start an interactive chat session");
    println!();
    println!("  {}", "infodesk --feedback \"text\" --rating 5".green().bold());
    println!("    Send feedback to the team");
    println!();
    println!("{}", "Options:".cyan());
    println!("  --lang <en|fr|rw>   Answer language");
    println!("  --config <PATH>     Config file (default ~/.config/infodesk/config.toml)");
    println!("  --help              Show this help message");
    println!();
}

/// Chat commands, labelled in the active language where a translation exists
pub fn print_chat_commands(strings: &Translations) {
    println!("{}", "Commands:".cyan());
    println!("  /lang <en|fr|rw>   Change language");
    println!("  /topic <name>      Ask about a topic");
    println!("  /rate <1-5>        {} {}", strings.rating_text, "★".yellow());
    println!("  /feedback          {}", strings.feedback_button);
    println!("  /feedback close    Hide the feedback panel");
    println!("  /voice             Voice input");
    println!("  exit | quit        End the session");
}

/// Star bar for a 0–5 rating
pub fn stars(rating: u8) -> String {
    (1..=5u8)
        .map(|i| if i <= rating { "★" } else { "☆" })
        .collect()
}

/// Render markdown emphasis, headings, lists and code for the terminal
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = MdParser::new_ext(markdown, options);

    let mut output = String::new();
    let mut strong = 0usize;
    let mut emphasis = 0usize;
    let mut in_code_block = false;

    for event in parser {
        match event {
            MdEvent::Start(Tag::Heading(level, ..)) => match level {
                HeadingLevel::H1 => output.push_str(&format!("\n{} ", "##".bright_cyan().bold())),
                HeadingLevel::H2 => output.push_str(&format!("\n{} ", "#".bright_cyan().bold())),
                _ => output.push('\n'),
            },
            MdEvent::End(Tag::Heading(..)) => output.push('\n'),
            MdEvent::Start(Tag::Paragraph) => {
                if !output.is_empty() && !output.ends_with('\n') {
                    output.push_str("\n\n");
                }
            }
            MdEvent::End(Tag::Paragraph) => output.push('\n'),
            MdEvent::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                output.push('\n');
            }
            MdEvent::End(Tag::CodeBlock(_)) => {
                in_code_block = false;
                output.push('\n');
            }
            MdEvent::Start(Tag::List(_)) | MdEvent::End(Tag::List(_)) => output.push('\n'),
            MdEvent::Start(Tag::Item) => output.push_str(&format!("{}  ", "•".yellow())),
            MdEvent::End(Tag::Item) => output.push('\n'),
            MdEvent::Start(Tag::Strong) => strong += 1,
            MdEvent::End(Tag::Strong) => strong = strong.saturating_sub(1),
            MdEvent::Start(Tag::Emphasis) => emphasis += 1,
            MdEvent::End(Tag::Emphasis) => emphasis = emphasis.saturating_sub(1),
            MdEvent::Code(ref code) => {
                output.push_str(&format!("`{}`", code.on_bright_black().white()));
            }
            MdEvent::Text(ref text) => {
                if in_code_block {
                    output.push_str(&text.dimmed().to_string());
                    continue;
                }
                let mut styled = text.normal();
                if strong > 0 {
                    styled = styled.bold();
                }
                if emphasis > 0 {
                    styled = styled.italic();
                }
                output.push_str(&styled.to_string());
            }
            MdEvent::SoftBreak => output.push(' '),
            MdEvent::HardBreak => output.push('\n'),
            _ => {}
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_markers() {
        colored::control::set_override(false);
        let rendered = render_markdown("Call **116** for *free* help");
        assert_eq!(rendered.trim(), "Call 116 for free help");
    }

    #[test]
    fn star_bar() {
        assert_eq!(stars(0), "☆☆☆☆☆");
        assert_eq!(stars(3), "★★★☆☆");
        assert_eq!(stars(5), "★★★★★");
    }
}
