use std::pin::pin;
use std::process::ExitCode;

use little_chat_core::{
    ModelClient, RequestInFlight, SummarizeUiState, SummarizeViewModel,
};
use owo_colors::OwoColorize;
use tokio::select;

use crate::ui::{self, BAR_CHAR};

pub async fn run(
    model_client: ModelClient,
    text: &str,
    stream: bool,
) -> ExitCode {
    if text.is_empty() {
        eprintln!("{}", "nothing to summarize".red());
        return ExitCode::FAILURE;
    }

    let view_model = SummarizeViewModel::new(model_client);
    let result = if stream {
        summarize_streaming(&view_model, text).await
    } else {
        ui::with_spinner("📝 Summarizing...", view_model.summarize(text)).await
    };
    if let Err(err) = result {
        eprintln!("{}", err.red());
        return ExitCode::FAILURE;
    }

    match view_model.status() {
        SummarizeUiState::Success(summary) => {
            if !stream {
                let bar = BAR_CHAR.bright_cyan();
                println!("{bar}{}", summary.bright_white());
            }
            ExitCode::SUCCESS
        }
        SummarizeUiState::Error(reason) => {
            eprintln!("{}⚠️  {}", BAR_CHAR.bright_red(), reason.red());
            ExitCode::FAILURE
        }
        status if status.is_loading() => {
            warn!("summarization returned while still loading");
            ExitCode::FAILURE
        }
        status => {
            warn!("summarization ended in an unexpected state: {status:?}");
            ExitCode::FAILURE
        }
    }
}

/// Prints the summary as it grows, following the view model's status.
async fn summarize_streaming(
    view_model: &SummarizeViewModel,
    text: &str,
) -> Result<(), RequestInFlight> {
    let mut ui_state = view_model.ui_state();
    let mut summarize = pin!(view_model.summarize_streaming(text));
    let mut printed = 0;

    let result = loop {
        select! {
            result = &mut summarize => break result,
            Ok(()) = ui_state.changed() => {
                let status = ui_state.borrow_and_update().clone();
                print_growth(&status, &mut printed);
            }
        }
    };

    // Updates published right before completion may not have been seen.
    print_growth(&ui_state.borrow_and_update().clone(), &mut printed);
    if printed > 0 {
        println!();
    }
    result
}

fn print_growth(status: &SummarizeUiState, printed: &mut usize) {
    let SummarizeUiState::Success(summary) = status else {
        return;
    };
    let Some(growth) = summary.get(*printed..) else {
        return;
    };
    if growth.is_empty() {
        return;
    }
    if *printed == 0 {
        print!("{}", BAR_CHAR.bright_cyan());
    }
    print!("{}", growth.bright_white());
    ui::flush();
    *printed = summary.len();
}
