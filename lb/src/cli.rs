//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LessonBot - lesson plans in a shared spreadsheet, over Telegram
#[derive(Parser)]
#[command(
    name = "lessonbot",
    about = "Telegram bot that records and looks up lesson plans in a Google Sheet",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `run`)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the bot: long-poll Telegram and serve the keep-alive endpoint
    Run,

    /// Create the plans worksheet and its header row if missing
    InitSheet,

    /// Print stored plans the way /plan would reply
    Query {
        /// Same arguments as /plan: [DATE] [CLASS...]
        #[arg(value_name = "ARGS")]
        args: Vec<String>,
    },
}
