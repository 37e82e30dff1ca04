use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use tempfile::TempDir;

use leadmate_agent::{
    AgentRuntime, AssistantTurn, ChatClient, ChatMessage, LlmError, TaskKind, ToolCall,
    ToolDefinition,
};
use leadmate_core::LeadDraft;
use leadmate_store::LeadStore;

struct ScriptedClient {
    turns: Mutex<VecDeque<AssistantTurn>>,
}

impl ScriptedClient {
    fn new(turns: Vec<AssistantTurn>) -> Self {
        Self { turns: Mutex::new(turns.into()) }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _tools: &[ToolDefinition],
    ) -> Result<AssistantTurn, LlmError> {
        self.turns
            .lock()
            .expect("script poisoned")
            .pop_front()
            .ok_or_else(|| LlmError::InvalidResponse("scripted turns exhausted".to_string()))
    }
}

#[tokio::test]
async fn account_brief_run_writes_a_note_and_a_followup_and_both_persist() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("leads.json");

    let mut store = LeadStore::open(&path).expect("store should open");
    let lead = store.create(LeadDraft {
        name: "Acme Freight".to_string(),
        website: "acme.test".to_string(),
        ..LeadDraft::default()
    });
    assert_eq!(lead.id.as_str(), "acme-freight");

    let script = vec![
        AssistantTurn {
            content: None,
            tool_calls: vec![
                ToolCall::function(
                    "call-1",
                    "add_lead_note",
                    r#"{"lead_id":"acme-freight","text":"ICP fit looks strong; assumption: EU lanes"}"#,
                ),
                ToolCall::function(
                    "call-2",
                    "update_lead_fields",
                    r#"{"lead_id":"acme-freight","patch":{"next_followup":"2026-09-02"}}"#,
                ),
            ],
        },
        AssistantTurn { content: Some("Brief ready.".to_string()), tool_calls: Vec::new() },
    ];

    let runtime = AgentRuntime::new(ScriptedClient::new(script), 6);
    let answer = runtime
        .run_task(&mut store, "acme-freight", TaskKind::AccountBrief)
        .await
        .expect("run should succeed");

    assert_eq!(answer, "Brief ready.");

    let lead = store.get("acme-freight").expect("lead should exist");
    assert_eq!(lead.notes.len(), 1);
    assert_eq!(lead.notes[0].text, "ICP fit looks strong; assumption: EU lanes");
    assert_eq!(lead.extra.get("next_followup"), Some(&json!("2026-09-02")));

    store.flush().expect("flush should succeed");

    let reopened = LeadStore::open(&path).expect("store should reopen");
    let persisted = reopened.get("acme-freight").expect("lead should persist");
    assert_eq!(persisted.notes.len(), 1);
    assert_eq!(persisted.notes[0].text, "ICP fit looks strong; assumption: EU lanes");
    assert_eq!(persisted.extra.get("next_followup"), Some(&json!("2026-09-02")));
}
