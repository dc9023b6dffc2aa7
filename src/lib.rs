//! IT assistant over Microsoft Graph (Intune, Entra ID) and OpenAI / Azure OpenAI

pub mod cmd;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod prompts;
pub mod report;

pub use error::{Error, Result};
