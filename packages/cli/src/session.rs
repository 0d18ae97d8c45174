//! Interactive room session: prints room events and reads commands from the terminal.

use std::sync::Arc;

use parking_lot::Mutex;
use rustyline::{DefaultEditor, error::ReadlineError};
use studyroom_session::{
    RoomCoordinator, Subscription,
    domain::{ConnectionState, Participant},
};
use tokio::sync::mpsc;

use super::{
    error::ClientError,
    formatter::MessageFormatter,
    ui::{Command, HELP, redisplay_prompt},
};

/// Run the interactive session until the user quits or input ends
pub async fn run_client_session(
    coordinator: &RoomCoordinator,
    name: &str,
) -> Result<(), ClientError> {
    let me = coordinator
        .local_participant()
        .map(|participant| participant.id.as_str().to_string())
        .unwrap_or_default();

    print!(
        "{}",
        MessageFormatter::format_roster(&coordinator.get_participants(), &me)
    );
    for message in coordinator.get_messages() {
        println!("{}", MessageFormatter::format_history_line(&message));
    }
    print!(
        "{}",
        MessageFormatter::format_passage(coordinator.get_current_passage().as_ref())
    );
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type /help for commands.\n",
        name
    );

    let subscriptions = subscribe_to_room(coordinator, name);

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    let prompt_name = name.to_string();
    let _readline_handle = std::thread::spawn(move || read_lines(&prompt_name, input_tx));

    while let Some(line) = input_rx.recv().await {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Who => print!(
                "{}",
                MessageFormatter::format_roster(&coordinator.get_participants(), &me)
            ),
            Command::History => {
                for message in coordinator.get_messages() {
                    println!("{}", MessageFormatter::format_history_line(&message));
                }
            }
            Command::Passage => print!(
                "{}",
                MessageFormatter::format_passage(coordinator.get_current_passage().as_ref())
            ),
            Command::Help => print!("{}", HELP),
            Command::Unknown(command) => println!("Unknown command: {} (try /help)", command),
            Command::Say(text) => {
                if !coordinator.send_message(text, name).await {
                    println!("Message not sent");
                }
            }
        }
    }

    for subscription in &subscriptions {
        subscription.unsubscribe();
    }
    Ok(())
}

/// Print room events as they arrive
fn subscribe_to_room(coordinator: &RoomCoordinator, name: &str) -> Vec<Subscription> {
    let previous: Arc<Mutex<Option<Vec<Participant>>>> = Arc::new(Mutex::new(None));
    let roster_name = name.to_string();
    let roster = coordinator.on_participants_change(move |current| {
        let mut previous = previous.lock();
        if let Some(before) = previous.as_ref() {
            let (joined, left) = roster_changes(before, current);
            for participant in &joined {
                print!("{}", MessageFormatter::format_participant_joined(participant));
            }
            for participant in &left {
                print!("{}", MessageFormatter::format_participant_left(participant));
            }
            if !joined.is_empty() || !left.is_empty() {
                redisplay_prompt(&roster_name);
            }
        }
        *previous = Some(current.to_vec());
    });

    let message_name = name.to_string();
    let messages = coordinator.on_message(move |message| {
        if message.is_own {
            print!("{}", MessageFormatter::format_sent_confirmation(message));
        } else {
            print!("{}", MessageFormatter::format_chat_message(message));
        }
        redisplay_prompt(&message_name);
    });

    let connection_name = name.to_string();
    let connection = coordinator.on_connection_change(move |state| {
        if state != ConnectionState::Connected {
            print!("{}", MessageFormatter::format_connection_state(state));
            redisplay_prompt(&connection_name);
        }
    });

    vec![roster, messages, connection]
}

/// Blocking readline loop; ends on Ctrl+C, Ctrl+D or when the receiver is gone
fn read_lines(name: &str, input_tx: mpsc::UnboundedSender<String>) {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            return;
        }
    };

    let prompt = format!("{}> ", name);

    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                tracing::info!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                tracing::info!("EOF");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {}", err);
                break;
            }
        }
    }
}

/// Participants that joined and left between two roster snapshots
fn roster_changes(
    before: &[Participant],
    after: &[Participant],
) -> (Vec<Participant>, Vec<Participant>) {
    let joined = after
        .iter()
        .filter(|participant| !before.iter().any(|p| p.id == participant.id))
        .cloned()
        .collect();
    let left = before
        .iter()
        .filter(|participant| !after.iter().any(|p| p.id == participant.id))
        .cloned()
        .collect();
    (joined, left)
}
