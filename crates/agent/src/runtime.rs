//! The bounded tool-calling loop.
//!
//! One run seeds a conversation from a lead snapshot and a task prompt,
//! then alternates endpoint requests with tool execution until the model
//! answers without tool calls or the round limit is hit. Tool side effects
//! land in the store immediately and are never rolled back; persisting
//! them is the caller's job.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use leadmate_store::LeadStore;

use crate::llm::{AssistantTurn, ChatClient, LlmError};
use crate::tasks::TaskKind;
use crate::tools::{descriptors, dispatch};
use crate::wire::ChatMessage;

/// Returned when the round limit is reached without a tool-free answer.
/// Mutations from completed rounds remain in effect.
pub const TOOL_LIMIT_FALLBACK: &str = "Reached tool-call limit; partial result.";

const SYSTEM_PROMPT: &str = "You are a BDR copilot for a B2B sales team.
Goal: help the rep qualify the lead and create actionable next steps.

Rules:
- Prefer concise, actionable outputs.
- Use tools to write notes and update lead fields when useful.
- If details are missing, make reasonable assumptions but write them as notes (\"assumption: ...\").";

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("lead not found: {0}")]
    UnknownLead(String),
    #[error("could not serialize lead context: {0}")]
    EncodeContext(#[from] serde_json::Error),
    #[error(transparent)]
    Llm(#[from] LlmError),
}

pub struct AgentRuntime<C> {
    client: C,
    max_tool_rounds: u32,
}

impl<C: ChatClient> AgentRuntime<C> {
    pub fn new(client: C, max_tool_rounds: u32) -> Self {
        Self { client, max_tool_rounds }
    }

    /// Drives one task against one lead. Returns the model's final text;
    /// the store may have been mutated through tool calls either way.
    pub async fn run_task(
        &self,
        store: &mut LeadStore,
        lead_id: &str,
        task: TaskKind,
    ) -> Result<String, AgentError> {
        let (lead_context, instruction) = {
            let lead = store
                .get(lead_id)
                .ok_or_else(|| AgentError::UnknownLead(lead_id.to_string()))?;
            (serde_json::to_string_pretty(lead)?, task.instruction(lead))
        };

        let run_id = Uuid::new_v4();
        info!(%run_id, lead_id, task = task.name(), "starting agent run");

        let tool_set = descriptors();
        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Lead context (JSON):\n{lead_context}\n\nTask:\n{instruction}\n"
            )),
        ];

        for round in 1..=self.max_tool_rounds {
            debug!(%run_id, round, messages = messages.len(), "requesting completion");
            let turn = self.client.complete(&messages, &tool_set).await?;

            if turn.tool_calls.is_empty() {
                info!(%run_id, rounds = round, outcome = "answer", "agent run finished");
                return Ok(turn.content.unwrap_or_default());
            }

            let AssistantTurn { content, tool_calls } = turn;
            messages.push(ChatMessage::assistant(content, tool_calls.clone()));

            for call in &tool_calls {
                let payload = dispatch(store, call);
                let tool = call.function.name.as_str();
                let call_id = call.id.as_str();
                match payload.get("error").and_then(Value::as_str) {
                    Some(reason) => {
                        debug!(%run_id, round, tool, call_id, reason, "tool call failed")
                    }
                    None => debug!(%run_id, round, tool, call_id, "tool call ok"),
                }
                messages.push(ChatMessage::tool_result(call, &payload));
            }
        }

        info!(%run_id, rounds = self.max_tool_rounds, outcome = "tool_limit", "agent run finished");
        Ok(TOOL_LIMIT_FALLBACK.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tempfile::TempDir;

    use leadmate_core::LeadDraft;
    use leadmate_store::LeadStore;

    use super::{AgentError, AgentRuntime, TOOL_LIMIT_FALLBACK};
    use crate::llm::{AssistantTurn, ChatClient, LlmError};
    use crate::tasks::TaskKind;
    use crate::wire::{ChatMessage, ToolCall, ToolDefinition};

    struct ScriptedClient {
        turns: Mutex<VecDeque<AssistantTurn>>,
        requests: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        fn new(turns: Vec<AssistantTurn>) -> Self {
            Self { turns: Mutex::new(turns.into()), requests: Mutex::new(Vec::new()) }
        }

        fn recorded_requests(&self) -> Vec<Vec<ChatMessage>> {
            self.requests.lock().expect("request log poisoned").clone()
        }
    }

    #[async_trait]
    impl ChatClient for ScriptedClient {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolDefinition],
        ) -> Result<AssistantTurn, LlmError> {
            self.requests.lock().expect("request log poisoned").push(messages.to_vec());
            self.turns
                .lock()
                .expect("script poisoned")
                .pop_front()
                .ok_or_else(|| LlmError::InvalidResponse("scripted turns exhausted".to_string()))
        }
    }

    fn seeded_store() -> (TempDir, LeadStore) {
        let dir = TempDir::new().expect("temp dir should be created");
        let mut store = LeadStore::open(dir.path().join("leads.json")).expect("store should open");
        store.create(LeadDraft {
            name: "Acme Freight".to_string(),
            website: "acme.test".to_string(),
            ..LeadDraft::default()
        });
        (dir, store)
    }

    fn text_turn(text: &str) -> AssistantTurn {
        AssistantTurn { content: Some(text.to_string()), tool_calls: Vec::new() }
    }

    fn tool_turn(calls: Vec<ToolCall>) -> AssistantTurn {
        AssistantTurn { content: None, tool_calls: calls }
    }

    fn note_call(id: &str, text: &str) -> ToolCall {
        ToolCall::function(
            id,
            "add_lead_note",
            format!(r#"{{"lead_id":"acme-freight","text":"{text}"}}"#),
        )
    }

    #[tokio::test]
    async fn text_only_response_ends_the_run_after_one_request() {
        let (_dir, mut store) = seeded_store();
        let runtime = AgentRuntime::new(ScriptedClient::new(vec![text_turn("All set.")]), 6);

        let answer = runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .expect("run should succeed");

        assert_eq!(answer, "All set.");
        let requests = runtime.client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert!(store.get("acme-freight").expect("lead should exist").notes.is_empty());
    }

    #[tokio::test]
    async fn the_seed_conversation_holds_persona_and_lead_context() {
        let (_dir, mut store) = seeded_store();
        let runtime = AgentRuntime::new(ScriptedClient::new(vec![text_turn("ok")]), 6);

        runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .expect("run should succeed");

        let requests = runtime.client.recorded_requests();
        let seed = &requests[0];
        assert_eq!(seed.len(), 2);
        assert_eq!(seed[0].role, "system");
        assert!(seed[0].content.as_deref().unwrap_or_default().contains("BDR copilot"));
        assert_eq!(seed[1].role, "user");
        let user = seed[1].content.as_deref().unwrap_or_default();
        assert!(user.starts_with("Lead context (JSON):\n"));
        assert!(user.contains("\"name\": \"Acme Freight\""));
        assert!(user.contains("\nTask:\n"));
    }

    #[tokio::test]
    async fn missing_text_content_returns_an_empty_answer() {
        let (_dir, mut store) = seeded_store();
        let runtime = AgentRuntime::new(ScriptedClient::new(vec![AssistantTurn::default()]), 6);

        let answer = runtime
            .run_task(&mut store, "acme-freight", TaskKind::Outreach)
            .await
            .expect("run should succeed");

        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn unknown_tool_calls_are_answered_in_the_next_request() {
        let (_dir, mut store) = seeded_store();
        let script = vec![
            tool_turn(vec![ToolCall::function("call-1", "nope", "{}")]),
            text_turn("done"),
        ];
        let runtime = AgentRuntime::new(ScriptedClient::new(script), 6);

        let answer = runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .expect("run should survive the unknown tool");

        assert_eq!(answer, "done");
        let requests = runtime.client.recorded_requests();
        assert_eq!(requests.len(), 2);

        let history = &requests[1];
        let assistant = history
            .iter()
            .find(|message| message.role == "assistant")
            .expect("assistant turn should be recorded");
        assert!(assistant.tool_calls.is_some());

        let tool_message = history
            .iter()
            .find(|message| message.role == "tool")
            .expect("tool result should be recorded");
        assert_eq!(tool_message.content.as_deref(), Some(r#"{"error":"Unknown tool: nope"}"#));
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call-1"));
    }

    #[tokio::test]
    async fn malformed_arguments_do_not_abort_the_run() {
        let (_dir, mut store) = seeded_store();
        let script = vec![
            tool_turn(vec![ToolCall::function("call-1", "add_lead_note", "{oops")]),
            text_turn("recovered"),
        ];
        let runtime = AgentRuntime::new(ScriptedClient::new(script), 6);

        let answer = runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .expect("run should survive malformed arguments");

        assert_eq!(answer, "recovered");
        assert!(store.get("acme-freight").expect("lead should exist").notes.is_empty());

        let requests = runtime.client.recorded_requests();
        let tool_message = requests[1]
            .iter()
            .find(|message| message.role == "tool")
            .expect("tool result should be recorded");
        let content = tool_message.content.as_deref().unwrap_or_default();
        assert!(content.contains("invalid arguments for add_lead_note"), "got {content}");
    }

    #[tokio::test]
    async fn the_round_limit_stops_the_run_with_all_effects_applied() {
        let (_dir, mut store) = seeded_store();
        let script = (1..=6)
            .map(|round| {
                tool_turn(vec![note_call(&format!("call-{round}"), &format!("note {round}"))])
            })
            .collect();
        let runtime = AgentRuntime::new(ScriptedClient::new(script), 6);

        let answer = runtime
            .run_task(&mut store, "acme-freight", TaskKind::FollowupPlan)
            .await
            .expect("run should end at the limit");

        assert_eq!(answer, TOOL_LIMIT_FALLBACK);
        assert_eq!(runtime.client.recorded_requests().len(), 6);

        let lead = store.get("acme-freight").expect("lead should exist");
        assert_eq!(lead.notes.len(), 6, "every round's side effect should be applied");
        assert_eq!(lead.notes[0].text, "note 6");
        assert_eq!(lead.notes[5].text, "note 1");
    }

    #[tokio::test]
    async fn the_round_limit_is_configurable() {
        let (_dir, mut store) = seeded_store();
        let script = vec![
            tool_turn(vec![note_call("call-1", "first")]),
            tool_turn(vec![note_call("call-2", "second")]),
        ];
        let runtime = AgentRuntime::new(ScriptedClient::new(script), 2);

        let answer = runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .expect("run should end at the limit");

        assert_eq!(answer, TOOL_LIMIT_FALLBACK);
        assert_eq!(runtime.client.recorded_requests().len(), 2);
        assert_eq!(store.get("acme-freight").expect("lead should exist").notes.len(), 2);
    }

    #[tokio::test]
    async fn endpoint_failures_propagate_as_hard_errors() {
        struct FailingClient;

        #[async_trait]
        impl ChatClient for FailingClient {
            async fn complete(
                &self,
                _messages: &[ChatMessage],
                _tools: &[ToolDefinition],
            ) -> Result<AssistantTurn, LlmError> {
                Err(LlmError::Endpoint { status: 500, message: "upstream down".to_string() })
            }
        }

        let (_dir, mut store) = seeded_store();
        let runtime = AgentRuntime::new(FailingClient, 6);

        let err = runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Llm(LlmError::Endpoint { status: 500, .. })));
        assert!(store.get("acme-freight").expect("lead should exist").notes.is_empty());
    }

    #[tokio::test]
    async fn effects_from_earlier_rounds_survive_an_endpoint_failure() {
        let (_dir, mut store) = seeded_store();
        // One tool round, then the script runs dry and the next request fails.
        let script = vec![tool_turn(vec![note_call("call-1", "kept")])];
        let runtime = AgentRuntime::new(ScriptedClient::new(script), 6);

        let err = runtime
            .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Llm(LlmError::InvalidResponse(_))));
        let lead = store.get("acme-freight").expect("lead should exist");
        assert_eq!(lead.notes.len(), 1);
        assert_eq!(lead.notes[0].text, "kept");
    }

    #[tokio::test]
    async fn runs_against_missing_leads_fail_before_any_request() {
        let (_dir, mut store) = seeded_store();
        let runtime = AgentRuntime::new(ScriptedClient::new(vec![text_turn("unused")]), 6);

        let err = runtime.run_task(&mut store, "ghost", TaskKind::AccountBrief).await.unwrap_err();

        assert!(matches!(err, AgentError::UnknownLead(ref id) if id == "ghost"));
        assert!(runtime.client.recorded_requests().is_empty());
    }
}
