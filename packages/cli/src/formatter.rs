//! Message formatting utilities for terminal display.

use studyroom_session::domain::{ConnectionState, Message, Participant, Passage};
use studyroom_shared::time::{timestamp_to_clock_time, timestamp_to_rfc3339};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Message formatter for terminal display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the roster shown right after joining
    ///
    /// The local participant is marked with "(me)" and the host with "(host)".
    pub fn format_roster(participants: &[Participant], me: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("\n\n{}\nParticipants:\n", RULE));

        if participants.is_empty() {
            output.push_str("(No participants)\n");
        } else {
            for participant in participants {
                let mut suffix = String::new();
                if participant.is_host {
                    suffix.push_str(" (host)");
                }
                if participant.id.as_str() == me {
                    suffix.push_str(" (me)");
                }
                output.push_str(&format!(
                    "{}{} - entered at {}\n",
                    participant.display_name,
                    suffix,
                    timestamp_to_rfc3339(participant.joined_at.value())
                ));
            }
        }

        output.push_str(RULE);
        output.push('\n');
        output
    }

    /// Format a participant-joined notification
    pub fn format_participant_joined(participant: &Participant) -> String {
        format!(
            "\n+ {} entered at {}\n",
            participant.display_name,
            timestamp_to_rfc3339(participant.joined_at.value())
        )
    }

    /// Format a participant-left notification
    pub fn format_participant_left(participant: &Participant) -> String {
        format!("\n- {} left the room\n", participant.display_name)
    }

    /// Format a chat message from another participant
    pub fn format_chat_message(message: &Message) -> String {
        format!(
            "\n\n{}\n@{}: {}\nsent at {}\n{}\n",
            THIN_RULE,
            message.sender,
            message.text.as_str(),
            timestamp_to_rfc3339(message.timestamp.value()),
            THIN_RULE
        )
    }

    /// Format a confirmation after the local participant's message was accepted
    pub fn format_sent_confirmation(message: &Message) -> String {
        format!("sent at {}\n", timestamp_to_rfc3339(message.timestamp.value()))
    }

    /// Format one line of the `/history` listing
    pub fn format_history_line(message: &Message) -> String {
        let marker = if message.is_own { "*" } else { " " };
        format!(
            "[{}]{} {}: {}",
            timestamp_to_clock_time(message.timestamp.value()),
            marker,
            message.sender,
            message.text.as_str()
        )
    }

    pub fn format_connection_state(state: ConnectionState) -> String {
        format!("\n[connection: {}]\n", state)
    }

    pub fn format_passage(passage: Option<&Passage>) -> String {
        match passage {
            Some(passage) => format!("Current passage: {}\n", passage),
            None => "No passage selected\n".to_string(),
        }
    }
}
