//! Decision sources
//!
//! - `scripted`: classic fixed strategies, offline and reproducible
//! - `chat`: a language model behind an OpenAI-compatible chat endpoint

pub mod chat;
pub mod scripted;

pub use chat::{system_prompt, user_prompt, ChatConfig, ChatSource};
pub use scripted::{ScriptedSource, Strategy, UnknownStrategy};
