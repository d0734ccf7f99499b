pub mod assistant;
pub mod format;

pub use assistant::{AssistantReply, AssistantService};
