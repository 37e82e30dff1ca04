//! Task prompts: pure functions from a lead snapshot to the instruction
//! text a run starts with. Side effects the instruction asks for (notes,
//! field updates) happen through tool calls, never here.

use std::str::FromStr;

use thiserror::Error;

use leadmate_core::Lead;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    AccountBrief,
    Outreach,
    FollowupPlan,
}

#[derive(Debug, Error)]
pub enum TaskParseError {
    #[error("unknown task `{0}` (expected brief, outreach, or followup)")]
    UnknownTask(String),
    #[error("the web-search task is not supported: no search backend is configured")]
    WebSearchUnavailable,
}

impl TaskKind {
    pub const ALL: [TaskKind; 3] =
        [TaskKind::AccountBrief, TaskKind::Outreach, TaskKind::FollowupPlan];

    pub fn name(self) -> &'static str {
        match self {
            TaskKind::AccountBrief => "brief",
            TaskKind::Outreach => "outreach",
            TaskKind::FollowupPlan => "followup",
        }
    }

    pub fn instruction(self, lead: &Lead) -> String {
        match self {
            TaskKind::AccountBrief => format!(
                "Create an account brief for {}: ICP fit, likely buying needs, key hypotheses, \
                 5 discovery questions, and a 3-step next action plan. Also add a concise note \
                 and set next_followup to a reasonable date.",
                lead.name
            ),
            TaskKind::Outreach => format!(
                "Draft a first outreach email to {} (short, friendly, B2B). Include: \
                 personalization using lead info, a clear value prop, and a CTA. Add a note \
                 summarizing the messaging angle and set status to Contacted.",
                lead.name
            ),
            TaskKind::FollowupPlan => format!(
                "Create a follow-up plan for {}: 3 touchpoints over 10 days \
                 (email/LinkedIn/call). Add a note with the plan and set next_followup.",
                lead.name
            ),
        }
    }
}

impl FromStr for TaskKind {
    type Err = TaskParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "brief" => Ok(Self::AccountBrief),
            "outreach" => Ok(Self::Outreach),
            "followup" | "follow-up" => Ok(Self::FollowupPlan),
            // Declared upstream but never backed by a tool; refusing it here
            // beats a run that silently does nothing.
            "web-search" | "websearch" | "web_lead_search" => {
                Err(TaskParseError::WebSearchUnavailable)
            }
            _ => Err(TaskParseError::UnknownTask(value.trim().to_string())),
        }
    }
}
