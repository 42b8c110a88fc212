use super::types::{Message, Role};

/// Ordered conversation shown in the message list
///
/// Messages are append-only except for the trailing model message, which
/// grows while a response streams in.
#[derive(Debug, Clone, Default)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Concatenate `fragment` onto the trailing model message
    ///
    /// Returns false (and changes nothing) when the last message is not
    /// from the model.
    pub fn append_to_last(&mut self, fragment: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Model => {
                last.content.push_str(fragment);
                true
            }
            _ => false,
        }
    }

    /// Overwrite the trailing model message (used to swap out the placeholder)
    pub fn replace_last(&mut self, content: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Model => {
                last.content.clear();
                last.content.push_str(content);
                true
            }
            _ => false,
        }
    }

    pub fn pop(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    /// Drop everything and start over from a single message
    pub fn reset_with(&mut self, first: Message) {
        self.messages.clear();
        self.messages.push(first);
    }

    pub fn get_all(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_is_concatenation() {
        let cases: &[&[&str]] = &[
            &["Hel", "lo", ", ", "world"],
            &[""],
            &["a", "", "b", ""],
            &["ආයු", "බෝවන්", "!"],
        ];

        for fragments in cases {
            let mut conversation = Conversation::new();
            conversation.push(Message::user("q"));
            conversation.push(Message::model(""));
            for fragment in *fragments {
                assert!(conversation.append_to_last(fragment));
            }
            assert_eq!(conversation.last().unwrap().content, fragments.concat());
            assert_eq!(conversation.len(), 2);
        }
    }

    #[test]
    fn test_append_refuses_user_tail() {
        let mut conversation = Conversation::new();
        assert!(!conversation.append_to_last("x"));

        conversation.push(Message::user("question"));
        assert!(!conversation.append_to_last("x"));
        assert_eq!(conversation.last().unwrap().content, "question");
    }

    #[test]
    fn test_replace_last_swaps_placeholder() {
        let mut conversation = Conversation::new();
        conversation.push(Message::model("..."));
        assert!(conversation.replace_last("Hi"));
        assert!(conversation.append_to_last(" there"));
        assert_eq!(conversation.last().unwrap().content, "Hi there");
    }

    #[test]
    fn test_reset_leaves_single_message() {
        let mut conversation = Conversation::new();
        conversation.push(Message::model("greeting"));
        conversation.push(Message::user("one"));
        conversation.push(Message::model("two"));

        conversation.reset_with(Message::model("fresh"));

        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.get_all()[0].content, "fresh");
        assert_eq!(conversation.get_all()[0].role, Role::Model);
    }
}
