//! Fixed conversation text: system instruction, greeting and status strings

/// Instruction sent with every request of a session
pub const SYSTEM_INSTRUCTION: &str = "You are a helpful and friendly assistant. Your name is Sampurana. Engage in a natural, supportive conversation.";

/// First model message of every session
pub const GREETING: &str = "ආයුබෝවන්! මම සම්පූර්ණ. ඔබට උදව් කළ හැක්කේ කෙසේද? (Hello! I am Sampurana. How can I help you?)";

/// Shown in the model bubble until the first fragment arrives
pub const PLACEHOLDER: &str = "...";

/// Banner and inline text for a failed response
pub fn stream_error_message(detail: &str) -> String {
    let detail = if detail.trim().is_empty() {
        "Unknown error"
    } else {
        detail
    };
    format!("Sorry, I encountered an error. Please try again. Error: {}", detail)
}
