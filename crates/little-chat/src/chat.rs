use std::process::ExitCode;

use little_chat_core::{ChatMessage, ChatViewModel, ModelClient, Participant};
use little_chat_model::ModelMessage;
use owo_colors::OwoColorize;

use crate::ui::{self, BAR_CHAR, LineReader};

fn greeting() -> Vec<ModelMessage> {
    vec![
        ModelMessage::User("Hello, I have 2 dogs in my house.".to_owned()),
        ModelMessage::Model(
            "Great to meet you. What would you like to know?".to_owned(),
        ),
    ]
}

pub async fn run(model_client: &ModelClient) -> ExitCode {
    let view_model = ChatViewModel::new(model_client, greeting());
    let mut ui_state = view_model.ui_state();

    let mut printed = 0;
    for msg in ui_state.borrow_and_update().messages() {
        print_message(msg);
        printed += 1;
    }

    let mut input = LineReader::stdin();
    loop {
        ui::prompt();
        let Some(line) = input.read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result =
            ui::with_spinner("🤔 Thinking...", view_model.send_message(line))
                .await;
        if let Err(err) = result {
            eprintln!("{}", err.red());
            continue;
        }

        let transcript = ui_state.borrow_and_update().clone();
        for msg in &transcript.messages()[printed..] {
            // What the user typed is already on the screen.
            if msg.participant() != Participant::User {
                print_message(msg);
            }
        }
        printed = transcript.len();
    }

    ExitCode::SUCCESS
}

fn print_message(msg: &ChatMessage) {
    match msg.participant() {
        Participant::User => {
            println!("{}🧑 {}", BAR_CHAR.bright_green(), msg.text());
        }
        Participant::Model => {
            println!(
                "{}🤖 {}",
                BAR_CHAR.bright_cyan(),
                msg.text().bright_white()
            );
        }
        Participant::Error => {
            println!("{}⚠️  {}", BAR_CHAR.bright_red(), msg.text().red());
        }
    }
}
