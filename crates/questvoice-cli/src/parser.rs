//! Command-line definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "questvoice")]
#[command(about = "Speak story narration through the questvoice playback engine")]
#[command(version)]
pub struct Cli {
    /// Speech synthesis endpoint
    #[arg(long, env = "QUESTVOICE_TTS_URL", global = true)]
    pub endpoint: Option<String>,

    /// Bearer token for the synthesis endpoint
    #[arg(long, env = "QUESTVOICE_TTS_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Cost-deduction endpoint; nothing is charged when unset
    #[arg(long = "ledger-url", env = "QUESTVOICE_LEDGER_URL", global = true)]
    pub ledger_url: Option<String>,

    #[arg(long = "ledger-token", env = "QUESTVOICE_LEDGER_TOKEN", global = true, hide_env_values = true)]
    pub ledger_token: Option<String>,

    /// JSON settings file
    #[arg(long, env = "QUESTVOICE_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Voice id, overriding the settings file
    #[arg(long, global = true)]
    pub voice: Option<String>,

    /// Directory that receives rendered clips
    #[arg(long = "out-dir", env = "QUESTVOICE_OUT_DIR", default_value = "questvoice-out", global = true)]
    pub out_dir: PathBuf,

    /// Play through the default audio device (needs the `local-output` feature)
    #[arg(long, global = true)]
    pub speaker: bool,

    /// Print engine events as JSON lines on stdout
    #[arg(long, global = true)]
    pub events: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Speak one line of narration
    Speak {
        /// Text to speak (markdown and game markup are stripped)
        text: String,
    },

    /// Replay a story transcript, letting autoplay decide what is spoken
    Story {
        /// Transcript JSON file
        transcript: PathBuf,

        /// Delay between message arrivals in milliseconds
        #[arg(long = "gap-ms", default_value_t = 0)]
        gap_ms: u64,
    },

    /// Print the effective settings as JSON
    Settings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_speak_args() {
        let cli = Cli::parse_from([
            "questvoice",
            "--endpoint",
            "http://localhost:9000/speak",
            "--voice",
            "bard",
            "speak",
            "Hello there.",
        ]);
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000/speak"));
        assert_eq!(cli.voice.as_deref(), Some("bard"));
        assert!(matches!(cli.command, Commands::Speak { ref text } if text == "Hello there."));
    }

    #[test]
    fn test_story_args() {
        let cli = Cli::parse_from(["questvoice", "story", "run.json", "--gap-ms", "250", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Story { transcript, gap_ms } => {
                assert_eq!(transcript, PathBuf::from("run.json"));
                assert_eq!(gap_ms, 250);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
