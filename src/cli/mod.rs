// src/cli/mod.rs - CLI definition (clap derive)

pub mod ask;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hoctap", about = "Vietnamese study assistant backed by Gemini", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve {
        /// Bind address (overrides [server].host)
        #[arg(long)]
        host: Option<String>,
        /// Port (overrides [server].port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Ask one question from the terminal and print the answer
    Ask {
        /// The question
        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
        /// Subject, e.g. "Toán học"
        #[arg(short, long)]
        subject: Option<String>,
        /// assistant | problem_solving
        #[arg(short, long, default_value = "assistant")]
        mode: String,
        /// full | step_by_step | hint
        #[arg(long, default_value = "full")]
        solution_mode: String,
        /// Attach an image of the exercise
        #[arg(long)]
        image: Option<String>,
    },
    /// Show config, provider and credential status
    Status,
}
