//! crates/college_assistant_core/src/prompt.rs
//!
//! Builds what gets sent to the completion provider: the fixed system prompt
//! and the message sequence around a user query.

use crate::domain::{ChatMessage, CollegeInfo};

const BREVITY_INSTRUCTION: &str =
    "IMPORTANT: Keep responses brief (1-3 sentences). If unsure, suggest contacting admissions.";

/// Renders the system prompt for `info`. Output is byte-identical for equal input.
pub fn build_system_prompt(info: &CollegeInfo) -> String {
    format!(
        "You are a helpful college assistant for {name}.\n\
         Use the following information to answer questions:\n\
         College Name: {name}\n\
         Location: {location}\n\
         Founded: {founded}\n\
         Popular Programs: {programs}\n\
         Tuition: {tuition}\n\
         Application Deadline: {deadline}\n\
         Contact Information: {contact}\n\n\
         {brevity}",
        name = info.name,
        location = info.location,
        founded = info.founded,
        programs = info.popular_programs.join(", "),
        tuition = info.tuition,
        deadline = info.application_deadline,
        contact = info.contact,
        brevity = BREVITY_INSTRUCTION,
    )
}

/// System message first (when present and non-empty), then the single user message.
pub fn build_messages(user_query: &str, system_prompt: Option<&str>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(prompt) = system_prompt.filter(|p| !p.is_empty()) {
        messages.push(ChatMessage::system(prompt));
    }
    messages.push(ChatMessage::user(user_query));
    messages
}
