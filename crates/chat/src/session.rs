use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
}

/// Per-conversation state. The session id keys the agent's own memory of
/// the conversation, so it stays stable for the life of the session.
#[derive(Clone, Debug)]
pub struct ChatSession {
    pub session_id: Uuid,
    pub messages: Vec<ChatMessage>,
    pub last_prompt: Option<String>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self { session_id: Uuid::new_v4(), messages: Vec::new(), last_prompt: None }
    }

    pub fn record_user(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.last_prompt = Some(text.clone());
        self.messages.push(ChatMessage { role: Role::User, text });
    }

    pub fn record_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(ChatMessage { role: Role::Assistant, text: text.into() });
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatSession, Role};

    #[test]
    fn transcript_keeps_role_tagged_messages_in_order() {
        let mut session = ChatSession::new();
        session.record_user("make me a deck about rust");
        session.record_assistant("Here is the link.");

        assert_eq!(session.messages.len(), 2);
        assert_eq!(session.messages[0].role, Role::User);
        assert_eq!(session.messages[1].role, Role::Assistant);
        assert_eq!(session.last_prompt.as_deref(), Some("make me a deck about rust"));
    }

    #[test]
    fn each_session_gets_its_own_id() {
        assert_ne!(ChatSession::new().session_id, ChatSession::new().session_id);
    }
}
