//! The closed set of operations the model may perform.
//!
//! Dispatch never fails: unknown names, malformed arguments, and store
//! errors all come back as `{"error": ...}` payloads that are folded into
//! the conversation, so the model can read the failure and adapt. Only the
//! variants listed here are reachable; adding a tool means adding a variant
//! and the exhaustive matches stop compiling until it is wired through.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use leadmate_core::{Lead, LeadPatch};
use leadmate_store::{LeadStore, StoreError};

use crate::wire::{ToolCall, ToolDefinition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeadTool {
    AddLeadNote,
    UpdateLeadFields,
}

impl LeadTool {
    pub const ALL: [LeadTool; 2] = [LeadTool::AddLeadNote, LeadTool::UpdateLeadFields];

    pub fn name(self) -> &'static str {
        match self {
            LeadTool::AddLeadNote => "add_lead_note",
            LeadTool::UpdateLeadFields => "update_lead_fields",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn descriptor(self) -> ToolDefinition {
        match self {
            LeadTool::AddLeadNote => ToolDefinition::function(
                self.name(),
                "Add a note to a lead.",
                json!({
                    "type": "object",
                    "properties": {
                        "lead_id": {"type": "string"},
                        "text": {"type": "string"}
                    },
                    "required": ["lead_id", "text"]
                }),
            ),
            LeadTool::UpdateLeadFields => ToolDefinition::function(
                self.name(),
                "Update basic fields on a lead (status/contact/next follow-up).",
                json!({
                    "type": "object",
                    "properties": {
                        "lead_id": {"type": "string"},
                        "patch": {
                            "type": "object",
                            "properties": {
                                "status": {"type": "string"},
                                "contact_name": {"type": "string"},
                                "contact_email": {"type": "string"},
                                "next_followup": {"type": "string"}
                            }
                        }
                    },
                    "required": ["lead_id", "patch"]
                }),
            ),
        }
    }
}

/// Descriptor set advertised on every request, in a fixed order.
pub fn descriptors() -> Vec<ToolDefinition> {
    LeadTool::ALL.iter().map(|tool| tool.descriptor()).collect()
}

/// Runs one requested call against the store and returns the result
/// payload. Success payloads carry the full updated lead record.
pub fn dispatch(store: &mut LeadStore, call: &ToolCall) -> Value {
    let name = call.function.name.as_str();
    let Some(tool) = LeadTool::from_name(name) else {
        return json!({"error": format!("Unknown tool: {name}")});
    };

    match execute(tool, store, &call.function.arguments) {
        Ok(payload) => payload,
        Err(reason) => json!({"error": reason}),
    }
}

#[derive(Debug, Deserialize)]
struct AddLeadNoteArgs {
    lead_id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct UpdateLeadFieldsArgs {
    lead_id: String,
    patch: FieldPatch,
}

/// The attributes `update_lead_fields` may set. They are CRM-style fields
/// rather than columns of the lead record itself, so they live in the
/// lead's extra map; keys outside this set are dropped during decoding.
#[derive(Debug, Default, Deserialize)]
struct FieldPatch {
    status: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    next_followup: Option<String>,
}

impl FieldPatch {
    fn into_entries(self) -> Vec<(String, Value)> {
        let mut entries = Vec::new();
        if let Some(status) = self.status {
            entries.push(("status".to_string(), Value::String(status)));
        }
        if let Some(contact_name) = self.contact_name {
            entries.push(("contact_name".to_string(), Value::String(contact_name)));
        }
        if let Some(contact_email) = self.contact_email {
            entries.push(("contact_email".to_string(), Value::String(contact_email)));
        }
        if let Some(next_followup) = self.next_followup {
            entries.push(("next_followup".to_string(), Value::String(next_followup)));
        }
        entries
    }
}

fn execute(tool: LeadTool, store: &mut LeadStore, raw_arguments: &str) -> Result<Value, String> {
    match tool {
        LeadTool::AddLeadNote => {
            let args: AddLeadNoteArgs = parse_arguments(tool, raw_arguments)?;
            let lead =
                store.append_note(&args.lead_id, &args.text).map_err(|err| err.to_string())?;
            encode_lead(&lead)
        }
        LeadTool::UpdateLeadFields => {
            let args: UpdateLeadFieldsArgs = parse_arguments(tool, raw_arguments)?;
            let lead = apply_field_patch(store, args).map_err(|err| err.to_string())?;
            encode_lead(&lead)
        }
    }
}

fn apply_field_patch(
    store: &mut LeadStore,
    args: UpdateLeadFieldsArgs,
) -> Result<Lead, StoreError> {
    let entries = args.patch.into_entries();
    let current = store
        .get(&args.lead_id)
        .ok_or_else(|| StoreError::NotFound(args.lead_id.clone()))?;
    let merged = current.merged_extra(entries);

    store.update(&args.lead_id, LeadPatch { extra: Some(merged), ..LeadPatch::default() })
}

fn parse_arguments<T: DeserializeOwned>(tool: LeadTool, raw: &str) -> Result<T, String> {
    // Some endpoints send an empty string instead of an empty object.
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw)
        .map_err(|err| format!("invalid arguments for {}: {err}", tool.name()))
}

fn encode_lead(lead: &Lead) -> Result<Value, String> {
    serde_json::to_value(lead).map_err(|err| format!("could not encode tool result: {err}"))
}
