//! Wire formats of the LLM vendors the assistant talks to.

pub mod chat_completions;
pub mod gemini;
