//! Personalized paragraph rewrites for the test session.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::survey::content::RewriteSource;
use crate::survey::page::{PairContent, PairOrder};

use super::prompts::{REWRITE_SYSTEM, rewrite_message};

pub struct Rewriter {
    llm: Arc<dyn LlmProvider>,
}

impl Rewriter {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Rewrite `source_text` for the reader described by `profile`.
    ///
    /// Output length is only bounded by the prompt's wording.
    pub async fn rewrite_paragraph(
        &self,
        profile: &str,
        source_text: &str,
    ) -> Result<String, LlmError> {
        let user = rewrite_message(profile, source_text);
        debug!(message = %user, "Rewrite user message");

        let request = CompletionRequest::new(vec![
            ChatMessage::system(REWRITE_SYSTEM),
            ChatMessage::user(user),
        ]);
        let response = self.llm.complete(request).await?;
        response.log_usage("rewrite");
        Ok(response.content)
    }

    /// Rewrite `source` and place the result next to its generic rewrite in
    /// a random order.
    pub async fn rewrite_pair<R: Rng + Send>(
        &self,
        profile: &str,
        source: &RewriteSource,
        rng: &mut R,
    ) -> Result<PairContent, LlmError> {
        let custom = self.rewrite_paragraph(profile, &source.original).await?;
        let order = if rng.gen_bool(0.5) {
            PairOrder::GenericFirst
        } else {
            PairOrder::CustomFirst
        };
        info!(title = %source.title, order = order.describe(), "Rewrite ready");
        Ok(arrange(custom, source.generic_rewrite.clone(), order))
    }
}

/// Place the customized and generic texts according to `order`.
pub fn arrange(custom: String, generic: String, order: PairOrder) -> PairContent {
    let (paragraph1, paragraph2) = match order {
        PairOrder::GenericFirst => (generic, custom),
        PairOrder::CustomFirst => (custom, generic),
    };
    PairContent {
        paragraph1,
        paragraph2,
        order,
    }
}
