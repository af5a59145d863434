//! Chat save flow.
//!
//! A session alternates between free conversation and a short detour that
//! turns the conversation into a stored assertion:
//!
//! ```text
//! Chatting --"save test", valid SQL--> AwaitingName --<name>--> Chatting
//!    ^  \--"save test", no SQL--> Chatting
//!    \--- anything else: one generated reply
//! ```
//!
//! `exit` / `quit` end the session from either state.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dqbot_core::{DEFAULT_LLM_TIMEOUT_SECS, EXIT_TOKENS, SAVE_TRIGGER, Turn, extract_sql, sql};
use dqbot_llm::prompts::SUMMARIZE_TO_SQL;
use dqbot_llm::{GenerationParams, LlmError, TextGenerator};
use dqbot_storage::AssertionStore;
use serde::Serialize;

use crate::blocking::blocking;
use crate::error::GatewayError;
use crate::pipeline::{RunPipeline, RunReport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayState {
    #[default]
    Chatting,
    AwaitingName,
}

/// One conversation: its visible history and where it is in the save flow.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    turns: Vec<Turn>,
    state: GatewayState,
    last_sql_candidate: Option<String>,
}

impl Session {
    /// Opens a session whose first turn is the fixed system prompt.
    #[must_use]
    pub fn new(id: impl Into<String>, system_prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            turns: vec![Turn::system(system_prompt)],
            state: GatewayState::Chatting,
            last_sql_candidate: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub const fn state(&self) -> GatewayState {
        self.state
    }

    #[must_use]
    pub fn candidate(&self) -> Option<&str> {
        self.last_sql_candidate.as_deref()
    }

    fn reset(&mut self) {
        self.state = GatewayState::Chatting;
        self.last_sql_candidate = None;
    }
}

/// Result of one turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnReply {
    /// Generated reply to ordinary input.
    Assistant { text: String },
    /// The save trigger found no well-formed SQL in the conversation.
    NoCandidate,
    /// A candidate was extracted; the next input names it.
    AwaitingName { candidate: String },
    Saved { name: String, location: PathBuf, run: RunReport },
    SaveFailed { reason: String },
    Exit,
}

impl TurnReply {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match *self {
            Self::Assistant { .. } => "assistant",
            Self::NoCandidate => "no_candidate",
            Self::AwaitingName { .. } => "awaiting_name",
            Self::Saved { .. } => "saved",
            Self::SaveFailed { .. } => "save_failed",
            Self::Exit => "exit",
        }
    }

    /// Text shown to the operator.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Assistant { text } => text.clone(),
            Self::NoCandidate => "I couldn't find a SQL test in our conversation yet. Describe the check \
                                  you want, then type 'save test' again."
                .to_owned(),
            Self::AwaitingName { candidate } => {
                format!("Please provide a name for the test:\n\n{candidate}")
            },
            Self::Saved { name, location, run } => {
                format!("Test '{name}' saved to {}.\n{}", location.display(), run.summary())
            },
            Self::SaveFailed { reason } => format!("Could not save the test: {reason}"),
            Self::Exit => "Goodbye!".to_owned(),
        }
    }
}

fn matches_command(input: &str, command: &str) -> bool {
    input.trim().eq_ignore_ascii_case(command)
}

fn is_exit(input: &str) -> bool {
    EXIT_TOKENS.iter().any(|token| matches_command(input, token))
}

pub struct ConversationGateway {
    generator: Arc<dyn TextGenerator>,
    params: GenerationParams,
    timeout: Duration,
    store: AssertionStore,
    pipeline: Arc<RunPipeline>,
}

impl ConversationGateway {
    #[must_use]
    pub fn new(generator: Arc<dyn TextGenerator>, store: AssertionStore, pipeline: Arc<RunPipeline>) -> Self {
        Self {
            generator,
            params: GenerationParams::default(),
            timeout: Duration::from_secs(DEFAULT_LLM_TIMEOUT_SECS),
            store,
            pipeline,
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Advances `session` by one operator input.
    ///
    /// # Errors
    /// `GatewayError::Generation` when the generator fails or times out; the
    /// session is then exactly as it was before the call.
    pub async fn handle_turn(&self, session: &mut Session, input: &str) -> Result<TurnReply, GatewayError> {
        if is_exit(input) {
            tracing::debug!(session = %session.id, "session ended by operator");
            return Ok(TurnReply::Exit);
        }
        match session.state {
            GatewayState::Chatting if matches_command(input, SAVE_TRIGGER) => {
                self.extract_candidate(session).await
            },
            GatewayState::Chatting => self.converse(session, input).await,
            GatewayState::AwaitingName => Ok(self.save_and_run(session, input).await),
        }
    }

    async fn generate(&self, turns: &[Turn]) -> Result<String, GatewayError> {
        match tokio::time::timeout(self.timeout, self.generator.generate(turns, &self.params)).await {
            Ok(reply) => Ok(reply?),
            Err(_) => {
                tracing::warn!(timeout = ?self.timeout, "generation timed out");
                Err(LlmError::Timeout(self.timeout).into())
            },
        }
    }

    async fn converse(&self, session: &mut Session, input: &str) -> Result<TurnReply, GatewayError> {
        let user = Turn::user(input);
        let mut turns = Vec::with_capacity(session.turns.len() + 1);
        turns.extend_from_slice(&session.turns);
        turns.push(user.clone());

        let reply = self.generate(&turns).await?;
        session.turns.push(user);
        session.turns.push(Turn::assistant(reply.clone()));
        tracing::debug!(session = %session.id, turns = session.turns.len(), "assistant replied");
        Ok(TurnReply::Assistant { text: reply })
    }

    async fn extract_candidate(&self, session: &mut Session) -> Result<TurnReply, GatewayError> {
        let mut turns = session.turns.clone();
        turns.push(Turn::user(SUMMARIZE_TO_SQL));

        let reply = self.generate(&turns).await?;
        let candidate = extract_sql(&reply);
        if let Err(e) = sql::validate(candidate) {
            tracing::debug!(session = %session.id, error = %e, "no valid SQL candidate");
            return Ok(TurnReply::NoCandidate);
        }

        let candidate = candidate.to_owned();
        session.last_sql_candidate = Some(candidate.clone());
        session.state = GatewayState::AwaitingName;
        Ok(TurnReply::AwaitingName { candidate })
    }

    async fn save_and_run(&self, session: &mut Session, input: &str) -> TurnReply {
        let Some(candidate) = session.last_sql_candidate.clone() else {
            session.reset();
            return TurnReply::SaveFailed { reason: "no test is waiting to be saved".to_owned() };
        };
        let name = input.trim().to_owned();

        let store = self.store.clone();
        let (save_name, body) = (name.clone(), candidate);
        let saved = blocking(move || Ok(store.save_validated(&save_name, &body)?)).await;
        session.reset();

        match saved {
            Ok(location) => {
                tracing::info!(session = %session.id, %name, "test saved, running all tests");
                let run = self.pipeline.run_reported().await;
                TurnReply::Saved { name, location, run }
            },
            Err(e) => {
                tracing::warn!(session = %session.id, %name, error = %e, "test not saved");
                TurnReply::SaveFailed { reason: e.to_string() }
            },
        }
    }
}
