//! Message formatting utilities for client display.

use crate::protocol::ChatMessage;

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the replayed history block shown right after registration.
    pub fn format_history(lists: &[Vec<String>]) -> String {
        let mut output = String::new();
        output.push_str("\n============================================================\n");
        output.push_str("Recent messages:\n");

        if lists.is_empty() {
            output.push_str("(none yet)\n");
        } else {
            for fields in lists {
                output.push_str(&Self::format_fields(fields.clone()));
                output.push('\n');
            }
        }

        output.push_str("============================================================\n");
        output
    }

    /// Format one received `StringList`, falling back to a raw rendering
    /// when it is not a `[timestamp, username, body]` triple.
    pub fn format_fields(fields: Vec<String>) -> String {
        match ChatMessage::from_fields(fields) {
            Ok(message) => Self::format_message(&message),
            Err(raw) => Self::format_raw(&raw),
        }
    }

    /// Format a chat message line.
    pub fn format_message(message: &ChatMessage) -> String {
        format!(
            "[{}] {}: {}",
            message.timestamp, message.username, message.body
        )
    }

    /// Format a list with unexpected arity.
    pub fn format_raw(fields: &[String]) -> String {
        format!("← Received: {}", fields.join(" "))
    }
}
