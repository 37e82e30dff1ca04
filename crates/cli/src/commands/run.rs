use leadmate_agent::{AgentError, AgentRuntime, OpenAiChatClient, TaskKind, TaskParseError};

use crate::commands::{flush_store, load_config, open_store, CommandResult};
use crate::GlobalArgs;

pub fn run(global: &GlobalArgs, task: &str, id: &str) -> CommandResult {
    let task = match task.parse::<TaskKind>() {
        Ok(task) => task,
        Err(error @ TaskParseError::WebSearchUnavailable) => {
            return CommandResult::failure("run", "unsupported_task", error.to_string(), 5);
        }
        Err(error) => {
            return CommandResult::failure("run", "task_usage", error.to_string(), 5);
        }
    };

    let config = match load_config("run", global) {
        Ok(config) => config,
        Err(result) => return result,
    };
    let mut store = match open_store("run", &config) {
        Ok(store) => store,
        Err(result) => return result,
    };

    let client = match OpenAiChatClient::new(&config.llm) {
        Ok(client) => client,
        Err(error) => {
            return CommandResult::failure("run", "llm_configuration", error.to_string(), 2);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("run", "runtime_init", error.to_string(), 3),
    };

    let agent = AgentRuntime::new(client, config.agent.max_tool_rounds);
    match runtime.block_on(agent.run_task(&mut store, id, task)) {
        Ok(answer) => {
            // Tool calls may have written notes or fields; persist them before reporting.
            if let Err(result) = flush_store("run", &store) {
                return result;
            }
            CommandResult::plain(answer)
        }
        Err(error @ AgentError::UnknownLead(_)) => {
            CommandResult::failure("run", "not_found", error.to_string(), 5)
        }
        Err(error) => CommandResult::failure("run", "agent_failure", error.to_string(), 6),
    }
}
