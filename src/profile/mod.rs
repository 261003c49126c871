//! Prompt client: learning-profile generation and paragraph rewrites.
//!
//! Both operations are plain remote calls with no retry; callers decide what
//! a failure means for the session.

pub mod profiler;
pub mod prompts;
pub mod rewriter;

pub use profiler::{LearningProfile, Profiler};
pub use rewriter::Rewriter;
