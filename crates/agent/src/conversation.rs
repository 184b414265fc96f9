use crate::llm::{ChatMessage, Role};

/// Ordered transcript of one chat session. It lives for the whole session
/// and is never truncated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a turn: seeds the system instruction on first use, then
    /// appends the user's text.
    pub fn begin_turn(&mut self, system_prompt: &str, user_text: &str) {
        if self.messages.is_empty() {
            self.messages.push(ChatMessage::system(system_prompt));
        }
        self.messages.push(ChatMessage::user(user_text));
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.messages.iter().filter(|message| message.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
