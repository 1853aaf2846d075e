//! Chat conversation types shared by the cache engine and the wire layer

mod message;
mod usage;

pub use message::{
    conversation_text, ContentPart, FunctionCall, ImageUrl, Message, MessageContent, ToolCall,
};
pub use usage::Usage;
