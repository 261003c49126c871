//! Error types for the preference survey.

use std::path::PathBuf;

/// Top-level error type for the survey.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Survey error: {0}")]
    Survey(#[from] SurveyError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Transcript error: {0}")]
    Transcript(#[from] TranscriptError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited")]
    RateLimited { provider: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the survey state machine and session.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SurveyError {
    #[error("Please select an option before continuing (page {page})")]
    SelectionRequired { page: usize },

    #[error("Page {page} does not accept a paragraph selection")]
    NotSelectable { page: usize },

    #[error("Page {page} is still waiting for generated content")]
    ContentPending { page: usize },

    #[error("Page {page} is not a generated interaction page")]
    NotGenerated { page: usize },

    #[error("A generation is already in progress")]
    GenerationPending,

    #[error("Profile has not been generated yet")]
    ProfileMissing,

    #[error("Please input a valid Participant ID and/or select a Group.")]
    InvalidParticipant,

    #[error("Invalid experiment group '{0}'. Must be either 'Experimental' or 'Control'.")]
    InvalidGroup(String),

    #[error("Closing answers can only be submitted on the closing page")]
    NotClosingPage,

    #[error("The session is already closed")]
    SessionClosed,

    #[error("Survey has no pages")]
    NoPages,
}

/// Errors loading survey content from disk.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse paragraph table {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to parse rewrite sources {path}: {source}")]
    RewriteSources {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Survey content has no {0}")]
    Empty(&'static str),
}

/// Transcript file errors.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Failed to open transcript {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write transcript: {0}")]
    Write(#[from] std::io::Error),
}

/// Result type alias for the survey.
pub type Result<T> = std::result::Result<T, Error>;
