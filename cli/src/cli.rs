use clap::Parser;
use infodesk_core::{AssistantConfig, Locale};
use std::path::PathBuf;

/// Ask the MIGEPROF information assistant from the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The question to ask
    #[arg(index = 1)] // Positional argument
    pub prompt: Option<String>,

    /// Enter interactive chat mode
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,

    /// Answer language (en, fr, rw)
    #[arg(short, long)]
    pub lang: Option<Locale>,

    /// Path to the config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Completion model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Enable verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Send feedback text and exit (requires --rating)
    #[arg(long, requires = "rating")]
    pub feedback: Option<String>,

    /// Star rating sent with --feedback
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    pub rating: Option<u8>,

    /// Store --lang, --model and --verbose in the config file and exit
    #[arg(long, default_value_t = false)]
    pub save_config: bool,
}

impl Args {
    /// Config values given on the command line; these win over file and environment
    pub fn overrides(&self) -> AssistantConfig {
        AssistantConfig {
            model_name: self.model.clone(),
            locale: self.lang,
            log_level: self.verbose.then(|| "debug".to_string()),
            ..AssistantConfig::default()
        }
    }
}
