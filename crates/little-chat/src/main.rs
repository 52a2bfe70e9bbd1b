//! A terminal front end for `little-chat-core`, talking to Gemini.

#[macro_use]
extern crate tracing;

mod chat;
mod cli;
mod summarize;
mod ui;

use std::process::ExitCode;

use clap::Parser;
use little_chat_core::ModelClient;

use crate::cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let model_client = ModelClient::new(cli.model_provider());
    debug!("starting {}", env!("CARGO_PKG_NAME"));

    match cli.command {
        Command::Chat => chat::run(&model_client).await,
        Command::Summarize { stream, text } => {
            let text = match text {
                Some(text) => text,
                None => match ui::read_to_end().await {
                    Some(text) => text,
                    None => return ExitCode::FAILURE,
                },
            };
            summarize::run(model_client, text.trim(), stream).await
        }
    }
}
