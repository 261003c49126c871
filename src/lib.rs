//! Learning Preference Survey: paired-paragraph survey with LLM-built
//! learning profiles and personalized rewrites.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod profile;
pub mod session;
pub mod survey;
pub mod tasks;
pub mod transcript;
