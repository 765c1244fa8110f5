use serde::{Deserialize, Serialize};

// 古いメッセージから捨てる
pub const MAX_CHAT_MESSAGES: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChatLog {
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub message_id: String,
    pub player_id: String,
    pub player_name: String,
    pub content: String,
    pub timestamp: i64,
    pub message_type: ChatMessageType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageType {
    Public,  // ロビー・マップ上の会話
    Meeting, // 会議中の告発
    System,  // システムメッセージ
}

impl ChatLog {
    pub fn add_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
        if self.messages.len() > MAX_CHAT_MESSAGES {
            let overflow = self.messages.len() - MAX_CHAT_MESSAGES;
            self.messages.drain(..overflow);
        }
    }

    pub fn add_system_message(&mut self, content: String, timestamp: i64) {
        let system_message = ChatMessage::new(
            "system".to_string(),
            "System".to_string(),
            content,
            ChatMessageType::System,
            timestamp,
        );
        self.add_message(system_message);
    }

    pub fn get_messages_by_type(&self, message_type: ChatMessageType) -> Vec<&ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.message_type == message_type)
            .collect()
    }
}

impl ChatMessage {
    pub fn new(
        player_id: String,
        player_name: String,
        content: String,
        message_type: ChatMessageType,
        timestamp: i64,
    ) -> Self {
        ChatMessage {
            message_id: uuid::Uuid::new_v4().to_string(),
            player_id,
            player_name,
            content,
            timestamp,
            message_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_log_keeps_the_newest_messages() {
        let mut log = ChatLog::default();
        for i in 0..(MAX_CHAT_MESSAGES + 5) {
            log.add_system_message(format!("message {}", i), i as i64);
        }
        assert_eq!(log.messages.len(), MAX_CHAT_MESSAGES);
        assert_eq!(log.messages[0].content, "message 5");
        assert_eq!(
            log.get_messages_by_type(ChatMessageType::System).len(),
            MAX_CHAT_MESSAGES
        );
    }
}
