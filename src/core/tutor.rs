// src/core/tutor.rs - One question in, one answer out
//
// Glue between the composer and an answer provider. Shared by the HTTP
// handlers and the `ask` subcommand.

use std::sync::Arc;

use super::prompt::PromptComposer;
use super::types::{ConversationTurn, DispatchResult, PromptRequest};
use crate::provider::{AnswerProvider, ImageInput};

/// What a single exchange produced.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub result: DispatchResult,
    /// Present only when the provider answered; failures are not recorded.
    pub turn: Option<ConversationTurn>,
}

#[derive(Clone)]
pub struct Tutor {
    composer: Arc<PromptComposer>,
    provider: Arc<dyn AnswerProvider>,
}

impl Tutor {
    pub fn new(composer: PromptComposer, provider: Arc<dyn AnswerProvider>) -> Self {
        Self {
            composer: Arc::new(composer),
            provider,
        }
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    pub async fn ask(
        &self,
        request: &PromptRequest,
        api_key: Option<&str>,
        image: Option<ImageInput>,
    ) -> Exchange {
        let prompt = self.composer.compose_request(request);
        tracing::info!(
            subject = %request.subject,
            mode = %request.mode,
            solution_mode = %request.solution_mode,
            has_image = image.is_some(),
            "Dispatching question"
        );

        match self.provider.dispatch(&prompt, api_key, image).await {
            Ok(answer) => {
                let turn = ConversationTurn::new(request, answer.clone());
                Exchange {
                    result: DispatchResult::from(Ok(answer)),
                    turn: Some(turn),
                }
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "Provider call failed: {e}");
                Exchange {
                    result: DispatchResult::from(Err(e)),
                    turn: None,
                }
            }
        }
    }
}
