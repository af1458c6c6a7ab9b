//! Where an agent sends its prompts.

use anyhow::{Context, Result};

use crate::llm::LlmClient;
use crate::stub::StubResponder;

/// One prompt for an executor.
///
/// `description` says what is wanted and is all the stub looks at;
/// `context` carries repository material for a real model.
#[derive(Debug, Clone)]
pub struct AgentTask {
    pub description: String,
    pub context: String,
}

impl AgentTask {
    pub fn new(description: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            context: context.into(),
        }
    }
}

/// Backend of an agent: a real model or the canned stub.
#[derive(Debug, Clone)]
pub enum Executor {
    Llm(LlmClient),
    Stub(StubResponder),
}

impl Executor {
    pub fn is_stub(&self) -> bool {
        matches!(self, Executor::Stub(_))
    }

    pub async fn execute_task(&self, task: &AgentTask) -> Result<String> {
        match self {
            Executor::Llm(client) => client
                .complete(&task.description, &task.context)
                .await
                .with_context(|| format!("LLM call failed ({})", client.model())),
            Executor::Stub(stub) => Ok(stub.respond(&task.description)),
        }
    }
}
