//! UI utilities for the client.

use std::io::Write;

/// Redisplay the prompt after printing an asynchronous event
pub fn redisplay_prompt(name: &str) {
    print!("{}> ", name);
    std::io::stdout().flush().ok();
}

pub const HELP: &str = "Commands:\n  /who      list participants\n  /history  show the message log\n  /passage  show the current passage\n  /help     show this help\n  /quit     leave the room and exit\n";

/// A line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Who,
    History,
    Passage,
    Help,
    Quit,
    /// Anything that is not a command is sent as a chat message
    Say(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if !line.starts_with('/') {
            return Command::Say(line);
        }
        match line {
            "/who" => Command::Who,
            "/history" => Command::History,
            "/passage" => Command::Passage,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Unknown(other),
        }
    }
}
