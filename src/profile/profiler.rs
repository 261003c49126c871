//! Learning-profile generation.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::survey::page::Choice;
use crate::survey::participant::Group;

use super::prompts::{PROFILER_SYSTEM, actual_profile_message, opposite_profile_message};

/// The two profiles generated for a session. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningProfile {
    /// Built from the participant's own choices.
    pub actual: String,
    /// Built from the options the participant did not choose.
    pub opposite: String,
}

impl LearningProfile {
    /// Profile that drives the rewrites for `group`.
    pub fn for_group(&self, group: Group) -> &str {
        match group {
            Group::Experimental => &self.actual,
            Group::Control => &self.opposite,
        }
    }
}

/// Builds learning profiles from a participant's training selections.
pub struct Profiler {
    llm: Arc<dyn LlmProvider>,
}

impl Profiler {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Generate the actual and opposite profiles.
    ///
    /// The second request carries the first exchange as prior context so the
    /// model writes a profile that reads differently from the first.
    pub async fn generate_profile(
        &self,
        selections: &[Choice],
        opposite_selections: &[Choice],
        pair_context: &[String],
    ) -> Result<LearningProfile, LlmError> {
        let started = Instant::now();
        info!(
            pairs = pair_context.len(),
            model = self.llm.model_name(),
            "Generating learning profiles"
        );

        let actual_msg = actual_profile_message(selections, pair_context);
        let opposite_msg = opposite_profile_message(opposite_selections, pair_context);
        debug!(actual = %actual_msg, opposite = %opposite_msg, "Profiler user messages");

        let mut conversation = vec![
            ChatMessage::system(PROFILER_SYSTEM),
            ChatMessage::user(actual_msg),
        ];
        let response = self
            .llm
            .complete(CompletionRequest::new(conversation.clone()))
            .await?;
        response.log_usage("profile");
        let actual = response.content;

        conversation.push(ChatMessage::assistant(actual.clone()));
        conversation.push(ChatMessage::user(opposite_msg));
        let response = self
            .llm
            .complete(CompletionRequest::new(conversation))
            .await?;
        response.log_usage("opposite profile");
        let opposite = response.content;

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Learning profiles generated"
        );
        Ok(LearningProfile { actual, opposite })
    }
}
