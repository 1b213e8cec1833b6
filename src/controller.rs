//! Conversation and request lifecycle.
//!
//! [`ChatController`] owns all session state. Operations that need the
//! network do not perform it themselves: they return an [`Effect`], the
//! runtime runs it with [`perform`] against a [`ChatBackend`], and the
//! outcome comes back through [`ChatController::apply`]. Every success,
//! failure and cleanup path therefore goes through `apply`.

use tracing::{debug, info, warn};

use crate::ai::{format_grouped, ChatBackend, CompletionRequest};
use crate::backend::{BackendConfig, BackendMode};
use crate::error::Result;
use crate::state::{ChatMessage, Conversation, APOLOGY};

/// Work that must happen off the event loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Dispatch(CompletionRequest),
    FetchLocalModels { server_address: String },
    FetchVisitorCount,
}

/// Result of an [`Effect`], fed back into [`ChatController::apply`]
#[derive(Debug)]
pub enum Completion {
    Reply(Result<String>),
    LocalModels {
        server_address: String,
        result: Result<Vec<String>>,
    },
    VisitorCount(Result<Option<u64>>),
}

pub async fn perform(backend: &dyn ChatBackend, effect: Effect) -> Completion {
    match effect {
        Effect::Dispatch(request) => Completion::Reply(backend.complete(&request).await),
        Effect::FetchLocalModels { server_address } => {
            let result = backend.list_local_models(&server_address).await;
            Completion::LocalModels {
                server_address,
                result,
            }
        }
        Effect::FetchVisitorCount => Completion::VisitorCount(backend.visitor_count().await),
    }
}

pub struct ChatController {
    conversation: Conversation,
    backend: BackendConfig,
    busy: bool,
    input: String,
    visitor_count: Option<u64>,
}

impl ChatController {
    pub fn new(backend: BackendConfig) -> Self {
        Self {
            conversation: Conversation::new(),
            backend,
            busy: false,
            input: String::new(),
            visitor_count: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    /// Visitor count ready for display, if the counter ever answered
    pub fn visitor_display(&self) -> Option<String> {
        self.visitor_count.map(format_grouped)
    }

    /// Whether the submit affordance is enabled
    pub fn can_submit(&self) -> bool {
        !self.busy && !self.input.trim().is_empty()
    }

    /// Fetches to issue once, when the UI first comes up
    pub fn on_mount(&self) -> Vec<Effect> {
        let mut effects = vec![Effect::FetchVisitorCount];
        if self.backend.mode() == BackendMode::Local {
            effects.push(Effect::FetchLocalModels {
                server_address: self.backend.server_address().to_string(),
            });
        }
        effects
    }

    /// Sends `text` as the next user turn.
    ///
    /// Blank text, or a dispatch already in flight, makes this a no-op that
    /// returns `None`.
    pub fn submit(&mut self, text: &str) -> Option<Effect> {
        let text = text.trim();
        if text.is_empty() || self.busy {
            return None;
        }

        self.busy = true;
        self.conversation.append(ChatMessage::user(text));
        self.input.clear();

        let prompt = text.to_string();
        let model = self.backend.model_id().to_string();
        let request = match self.backend.mode() {
            BackendMode::Hosted => CompletionRequest::Hosted { model, prompt },
            BackendMode::Local => CompletionRequest::Local {
                server_address: self.backend.server_address().to_string(),
                model,
                prompt,
            },
        };
        debug!(mode = %self.backend.mode(), model = request.model(), "dispatching");
        Some(Effect::Dispatch(request))
    }

    /// Submits whatever is in the input buffer
    pub fn submit_input(&mut self) -> Option<Effect> {
        let text = self.input.clone();
        self.submit(&text)
    }

    pub fn set_mode(&mut self, mode: BackendMode) -> Option<Effect> {
        if !self.backend.set_mode(mode) {
            return None;
        }
        info!(%mode, model = self.backend.model_id(), "backend mode changed");
        self.refresh_local_models()
    }

    pub fn set_server_address(&mut self, addr: &str) -> Result<()> {
        self.backend.set_server_address(addr)?;
        info!(server_address = self.backend.server_address(), "server address changed");
        Ok(())
    }

    pub fn set_model_id(&mut self, id: &str) -> Result<()> {
        self.backend.set_model_id(id)?;
        info!(model = id, "model changed");
        Ok(())
    }

    /// Re-reads the local catalog; nothing to do in hosted mode
    pub fn refresh_local_models(&self) -> Option<Effect> {
        if self.backend.mode() != BackendMode::Local {
            return None;
        }
        Some(Effect::FetchLocalModels {
            server_address: self.backend.server_address().to_string(),
        })
    }

    pub fn apply(&mut self, completion: Completion) {
        match completion {
            Completion::Reply(result) => {
                let turn = match result {
                    Ok(text) => ChatMessage::assistant(text),
                    Err(e) => {
                        warn!(error = %e, "completion failed");
                        ChatMessage::assistant(APOLOGY)
                    }
                };
                self.conversation.append(turn);
                self.busy = false;
            }
            Completion::LocalModels {
                server_address,
                result,
            } => match result {
                Ok(models) => {
                    info!(%server_address, count = models.len(), "local models fetched");
                    self.backend.replace_local_models(models);
                }
                Err(e) => warn!(error = %e, %server_address, "could not list local models"),
            },
            Completion::VisitorCount(result) => match result {
                Ok(Some(count)) => self.visitor_count = Some(count),
                Ok(None) => debug!("visitor counter answered without a value"),
                Err(e) => warn!(error = %e, "could not fetch visitor count"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use crate::state::{ChatRole, GREETING};

    fn controller(mode: BackendMode) -> ChatController {
        ChatController::new(BackendConfig::new(
            mode,
            "http://localhost:11434",
            "proutgpt:latest",
            vec!["m1".to_string(), "m2".to_string()],
        ))
    }

    #[test]
    fn hosted_submit_builds_gateway_request() {
        let mut chat = controller(BackendMode::Hosted);
        let effect = chat.submit("  blague?  ");
        assert_eq!(
            effect,
            Some(Effect::Dispatch(CompletionRequest::Hosted {
                model: "m1".to_string(),
                prompt: "blague?".to_string(),
            }))
        );
        assert!(chat.is_busy());
        assert_eq!(chat.conversation().last(), Some(&ChatMessage::user("blague?")));
    }

    #[test]
    fn local_submit_targets_server_address() {
        let mut chat = controller(BackendMode::Local);
        let effect = chat.submit("salut");
        assert_eq!(
            effect,
            Some(Effect::Dispatch(CompletionRequest::Local {
                server_address: "http://localhost:11434".to_string(),
                model: "proutgpt:latest".to_string(),
                prompt: "salut".to_string(),
            }))
        );
    }

    #[test]
    fn submit_input_clears_the_buffer() {
        let mut chat = controller(BackendMode::Hosted);
        chat.input_mut().push_str("coucou");
        assert!(chat.can_submit());
        assert!(chat.submit_input().is_some());
        assert_eq!(chat.input(), "");
        assert!(!chat.can_submit());
    }

    #[test]
    fn cannot_submit_while_busy_even_with_input() {
        let mut chat = controller(BackendMode::Hosted);
        chat.submit("un");
        chat.input_mut().push_str("deux");
        assert!(!chat.can_submit());
        assert_eq!(chat.submit_input(), None);
        assert_eq!(chat.input(), "deux");
    }

    #[test]
    fn failed_reply_appends_apology_and_releases_busy() {
        let mut chat = controller(BackendMode::Hosted);
        chat.submit("blague?");
        chat.apply(Completion::Reply(Err(ChatError::NotLocalMode)));

        assert!(!chat.is_busy());
        let last = chat.conversation().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, APOLOGY);
    }

    #[test]
    fn mount_fetches_catalog_only_in_local_mode() {
        assert_eq!(controller(BackendMode::Hosted).on_mount(), vec![Effect::FetchVisitorCount]);
        assert_eq!(
            controller(BackendMode::Local).on_mount(),
            vec![
                Effect::FetchVisitorCount,
                Effect::FetchLocalModels {
                    server_address: "http://localhost:11434".to_string()
                },
            ]
        );
    }

    #[test]
    fn switching_to_hosted_fetches_nothing() {
        let mut chat = controller(BackendMode::Local);
        assert_eq!(chat.set_mode(BackendMode::Hosted), None);
        assert_eq!(chat.set_mode(BackendMode::Hosted), None);
        assert!(chat.set_mode(BackendMode::Local).is_some());
        assert!(chat.refresh_local_models().is_some());
    }

    #[test]
    fn visitor_count_is_grouped_for_display() {
        let mut chat = controller(BackendMode::Hosted);
        assert_eq!(chat.visitor_display(), None);
        chat.apply(Completion::VisitorCount(Ok(None)));
        assert_eq!(chat.visitor_display(), None);
        chat.apply(Completion::VisitorCount(Ok(Some(12345))));
        assert_eq!(chat.visitor_display().as_deref(), Some("12,345"));
        assert_eq!(chat.conversation().turns()[0].content, GREETING);
    }

    #[test]
    fn failed_visitor_count_changes_nothing() {
        let mut chat = controller(BackendMode::Hosted);
        chat.apply(Completion::VisitorCount(Err(ChatError::NotLocalMode)));
        assert_eq!(chat.visitor_display(), None);
        assert_eq!(chat.conversation().len(), 1);

        chat.apply(Completion::VisitorCount(Ok(Some(12345))));
        chat.apply(Completion::VisitorCount(Err(ChatError::NotLocalMode)));
        assert_eq!(chat.visitor_display().as_deref(), Some("12,345"));
        assert_eq!(chat.conversation().len(), 1);
        assert!(!chat.is_busy());
    }
}
