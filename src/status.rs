use chrono::{DateTime, Utc};
use strum_macros::Display;

#[derive(Clone, Copy, PartialEq, Eq, Display)]
pub enum MessageType {
    Error,
    Warning,
    Info,
    Status,
}

#[derive(Clone)]
pub struct StatusMessage {
    pub timestamp: DateTime<Utc>,
    pub message_type: MessageType,
    pub content: String,
}

impl StatusMessage {
    pub fn new(message_type: MessageType, content: String) -> Self {
        StatusMessage {
            timestamp: Utc::now(),
            message_type,
            content,
        }
    }
}

/// Bounded in-memory log. Headless runs echo every message to stdout as it
/// arrives; the interactive UI renders the buffer instead.
pub struct MessageLog {
    messages: Vec<StatusMessage>,
    headless: bool,
    max_size: usize,
}

impl MessageLog {
    pub fn new(headless: bool, max_size: Option<usize>) -> Self {
        MessageLog {
            messages: Vec::new(),
            headless,
            max_size: max_size.unwrap_or(500),
        }
    }

    pub fn add_message(&mut self, message: StatusMessage) {
        if self.messages.len() == self.max_size {
            self.messages.remove(0);
        }
        self.messages.push(message.clone());

        if self.headless {
            let color = match message.message_type {
                MessageType::Error => "\x1b[31m",
                MessageType::Warning => "\x1b[33m",
                MessageType::Info => "\x1b[0m",
                MessageType::Status => "\x1b[36m",
            };
            let reset = "\x1b[0m";
            println!(
                "{}{} | {:^8} | {}{}",
                color,
                message.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
                message.message_type.to_string(),
                message.content,
                reset,
            )
        }
    }

    pub fn get_all_messages(&self) -> Vec<StatusMessage> {
        self.messages.clone()
    }

    pub fn size(&self) -> usize {
        self.messages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_bounded() {
        let mut log = MessageLog::new(false, Some(3));
        for i in 0..5 {
            log.add_message(StatusMessage::new(MessageType::Info, format!("message {i}")));
        }
        assert_eq!(log.size(), 3);
        assert_eq!(log.get_all_messages()[0].content, "message 2");
    }
}
