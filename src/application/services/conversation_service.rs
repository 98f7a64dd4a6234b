//! Conversation Service - Drives one turn of the adventure
//!
//! A turn sends the conversation and the tool catalog to the provider,
//! validates and applies whatever tool calls come back, and, when the model
//! answered with tool calls only, asks once more for narration of what just
//! happened. The updated session is returned to the caller, which owns
//! persistence.
//!
//! ```text
//! AwaitingUserInput -> RequestSent -> NarrativeReady ----------------> Idle
//!                                  \-> ToolCallsPending -> FollowUpSent -/
//! ```

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::application::ports::outbound::{
    LlmError, LlmProviderPort, ProviderReply, ProviderRequest, ToolDefinition,
};
use crate::application::services::llm::prompt_builder::{build_opening_prompt, build_system_prompt};
use crate::application::services::tool_execution_service::{
    ToolExecutionResult, ToolExecutionService,
};
use crate::domain::entities::{AdventureSession, Message};
use crate::domain::value_objects::{GameTool, MalformedToolArguments, ToolRegistry};

/// Narrative used when neither the reply nor the follow-up carried text
pub const FALLBACK_NARRATIVE: &str = "The dungeon master ponders...";

pub const TURN_FAILED_MESSAGE: &str =
    "An error occurred communicating with the AI. Please check your API key and try again.";

pub const OPENING_FAILED_MESSAGE: &str =
    "An error occurred generating the opening. Please check your API key and try again.";

/// States a turn passes through, recorded in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnPhase {
    AwaitingUserInput,
    RequestSent,
    ToolCallsPending,
    FollowUpSent,
    NarrativeReady,
    Idle,
}

#[derive(Debug, thiserror::Error)]
pub enum ConversationError {
    #[error(transparent)]
    MalformedToolArguments(#[from] MalformedToolArguments),

    #[error("The opening narrative has already been generated")]
    OpeningAlreadyGenerated,
}

/// Everything a finished turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session: AdventureSession,
    pub narrative: String,
    pub tool_results: Vec<ToolExecutionResult>,
    pub phases: Vec<TurnPhase>,
    pub follow_up_sent: bool,
    /// Transport failure that was turned into the placeholder message
    pub upstream_error: Option<String>,
}

/// How a single run of the state machine ended, before it is folded into
/// the session
struct TurnRun {
    narrative: String,
    tool_results: Vec<ToolExecutionResult>,
    phases: Vec<TurnPhase>,
    follow_up_sent: bool,
    upstream_error: Option<LlmError>,
}

/// Service orchestrating provider calls and tool application
pub struct ConversationService {
    registry: &'static ToolRegistry,
    executor: ToolExecutionService,
}

impl ConversationService {
    pub fn new() -> Self {
        Self {
            registry: ToolRegistry::standard(),
            executor: ToolExecutionService::new(),
        }
    }

    /// Catalog in the provider-neutral shape
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.registry.tools().iter().map(ToolDefinition::from).collect()
    }

    /// Run one player turn
    ///
    /// Appends the player's message, runs the turn and appends the resolved
    /// narrative. Upstream failures end the turn with a placeholder message
    /// instead of an error; malformed tool calls fail the turn and the
    /// caller's session is left untouched.
    #[instrument(skip(self, provider, session, action), fields(provider = %provider.kind()))]
    pub async fn submit_action(
        &self,
        provider: &dyn LlmProviderPort,
        mut session: AdventureSession,
        action: &str,
    ) -> Result<TurnOutcome, ConversationError> {
        session.messages.push(Message::user(action));
        let history = session.messages.clone();

        let run = self.run_turn(provider, &mut session, history).await?;
        let narrative = match &run.upstream_error {
            Some(_) => TURN_FAILED_MESSAGE.to_string(),
            None => run.narrative.clone(),
        };
        session.messages.push(Message::assistant(narrative.clone()));

        Ok(Self::finish(session, narrative, run))
    }

    /// Produce the opening narrative of a fresh adventure
    ///
    /// The synthetic opening request is sent but never recorded; only the
    /// model's reply becomes the first message of the history.
    #[instrument(skip(self, provider, session), fields(provider = %provider.kind()))]
    pub async fn generate_opening(
        &self,
        provider: &dyn LlmProviderPort,
        mut session: AdventureSession,
    ) -> Result<TurnOutcome, ConversationError> {
        if !session.needs_opening() {
            return Err(ConversationError::OpeningAlreadyGenerated);
        }

        let opening = build_opening_prompt(&session.character, &session.preferences);
        let run = self
            .run_turn(provider, &mut session, vec![Message::user(opening)])
            .await?;

        let narrative = match &run.upstream_error {
            Some(_) => OPENING_FAILED_MESSAGE.to_string(),
            None => {
                session.has_opening = true;
                run.narrative.clone()
            }
        };
        session.messages.push(Message::assistant(narrative.clone()));

        Ok(Self::finish(session, narrative, run))
    }

    async fn run_turn(
        &self,
        provider: &dyn LlmProviderPort,
        session: &mut AdventureSession,
        history: Vec<Message>,
    ) -> Result<TurnRun, ConversationError> {
        let mut run = TurnRun {
            narrative: String::new(),
            tool_results: Vec::new(),
            phases: vec![TurnPhase::AwaitingUserInput],
            follow_up_sent: false,
            upstream_error: None,
        };

        let request = ProviderRequest {
            system_prompt: build_system_prompt(
                &session.preferences,
                &session.character,
                &session.game_state,
            ),
            messages: history,
            tools: self.tool_definitions(),
        };

        enter(&mut run, TurnPhase::RequestSent);
        let reply = match provider.send(&request).await {
            Ok(reply) => reply,
            Err(e) => return Ok(fail(run, e)),
        };

        let tools = self.parse_invocations(&reply)?;

        if reply.has_narrative() {
            enter(&mut run, TurnPhase::NarrativeReady);
            run.tool_results = self.apply(&tools, session);
            run.narrative = reply.narrative.trim().to_string();
        } else if !tools.is_empty() {
            enter(&mut run, TurnPhase::ToolCallsPending);
            run.tool_results = self.apply(&tools, session);

            let follow_up = ProviderRequest {
                system_prompt: build_system_prompt(
                    &session.preferences,
                    &session.character,
                    &session.game_state,
                ),
                ..request
            };

            enter(&mut run, TurnPhase::FollowUpSent);
            run.follow_up_sent = true;
            let narration = match provider.follow_up(&follow_up, &reply).await {
                Ok(narration) => narration,
                Err(e) => return Ok(fail(run, e)),
            };
            if !narration.tool_invocations.is_empty() {
                warn!(
                    "Ignoring {} tool calls in the follow-up reply",
                    narration.tool_invocations.len()
                );
            }

            enter(&mut run, TurnPhase::NarrativeReady);
            run.narrative = if narration.has_narrative() {
                narration.narrative.trim().to_string()
            } else {
                FALLBACK_NARRATIVE.to_string()
            };
        } else {
            enter(&mut run, TurnPhase::NarrativeReady);
            run.narrative = FALLBACK_NARRATIVE.to_string();
        }

        enter(&mut run, TurnPhase::Idle);
        Ok(run)
    }

    /// Every call is validated before any of them is applied
    fn parse_invocations(&self, reply: &ProviderReply) -> Result<Vec<GameTool>, ConversationError> {
        reply
            .tool_invocations
            .iter()
            .map(|call| {
                self.registry
                    .parse(&call.name, &call.arguments)
                    .map_err(ConversationError::from)
            })
            .collect()
    }

    fn apply(&self, tools: &[GameTool], session: &mut AdventureSession) -> Vec<ToolExecutionResult> {
        let results = self
            .executor
            .execute_all(tools, &mut session.character, &mut session.game_state);
        if !results.is_empty() {
            info!("Applied {} tool calls", results.len());
        }
        results
    }

    fn finish(session: AdventureSession, narrative: String, run: TurnRun) -> TurnOutcome {
        TurnOutcome {
            session,
            narrative,
            tool_results: run.tool_results,
            phases: run.phases,
            follow_up_sent: run.follow_up_sent,
            upstream_error: run.upstream_error.map(|e| e.to_string()),
        }
    }
}

impl Default for ConversationService {
    fn default() -> Self {
        Self::new()
    }
}

fn enter(run: &mut TurnRun, phase: TurnPhase) {
    debug!(?phase, "Turn transition");
    run.phases.push(phase);
}

fn fail(mut run: TurnRun, error: LlmError) -> TurnRun {
    warn!("Upstream failure, ending turn with placeholder: {}", error);
    run.upstream_error = Some(error);
    run.phases.push(TurnPhase::AwaitingUserInput);
    run
}
