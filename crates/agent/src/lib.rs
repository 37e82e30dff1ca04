//! Agent runtime - bounded tool-calling against a chat-completion endpoint
//!
//! This crate is the brain of leadmate: given one lead and one task, it
//! converses with a language model that may request tool calls, executes
//! those calls against the lead store, and feeds the results back until the
//! model produces a final text answer or the round limit is hit.
//!
//! # Architecture
//!
//! One run moves through a fixed cycle:
//! 1. **Seed** (`runtime`) - system persona + lead snapshot + task prompt
//! 2. **Request** (`llm`) - full history and tool descriptors, tool choice
//!    left to the model
//! 3. **Execute** (`tools`) - each requested call runs against the store;
//!    every result, success or error payload, returns as a tool message
//! 4. **Repeat** until a tool-free answer or `max_tool_rounds`
//!
//! # Key Types
//!
//! - `AgentRuntime` - loop orchestrator (see `runtime`)
//! - `ChatClient` - pluggable endpoint trait; `OpenAiChatClient` in production
//! - `LeadTool` - the closed set of operations the model may perform
//! - `TaskKind` - the prompt catalogue (`tasks`)
//!
//! # Safety Principle
//!
//! The model never touches lead records directly. Every mutation goes
//! through `LeadTool` dispatch, which validates arguments against the
//! declared schema first and turns every failure into an error payload the
//! model can read. Unknown tool names and a hit round limit are contained
//! the same way; only endpoint failures abort a run.

pub mod llm;
pub mod runtime;
pub mod tasks;
pub mod tools;
pub mod wire;

pub use llm::{AssistantTurn, ChatClient, LlmError, OpenAiChatClient};
pub use runtime::{AgentError, AgentRuntime, TOOL_LIMIT_FALLBACK};
pub use tasks::{TaskKind, TaskParseError};
pub use tools::{descriptors, dispatch, LeadTool};
pub use wire::{ChatMessage, FunctionCall, ToolCall, ToolDefinition};
