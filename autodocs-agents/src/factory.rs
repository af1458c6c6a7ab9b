//! Agent construction with stub fallback.
//!
//! [`instantiate`] tries to build an agent around a real LLM client. When
//! that fails (missing key, broken HTTP stack) the agent is built around the
//! stub instead. It never returns an error: a pipeline without credentials
//! still runs and produces deterministic output.

use std::path::PathBuf;

use crate::executor::Executor;
use crate::llm::{self, LlmClient, LlmError};
use crate::stub::StubResponder;

/// Which agent is being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Research,
    Writer,
    Deployment,
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Research => write!(f, "research"),
            AgentKind::Writer => write!(f, "writer"),
            AgentKind::Deployment => write!(f, "deployment"),
        }
    }
}

/// Inputs shared by every agent constructor.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Directory holding the writer's Markdown templates.
    pub templates_dir: PathBuf,
    pub model: String,
    pub base_url: String,
}

impl AgentSettings {
    /// Templates shipped with this crate.
    pub fn bundled_templates_dir() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            templates_dir: Self::bundled_templates_dir(),
            model: llm::DEFAULT_MODEL.to_string(),
            base_url: llm::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// An agent that can be built around any executor.
pub trait Agent: Sized {
    const KIND: AgentKind;

    fn with_executor(executor: Executor, settings: &AgentSettings) -> Self;
}

/// Build the real executor for a credential.
fn connect(settings: &AgentSettings, credential: Option<&str>) -> Result<Executor, LlmError> {
    let key = credential.ok_or(LlmError::MissingApiKey)?;
    let client = LlmClient::new(key)?
        .with_model(&settings.model)
        .with_base_url(&settings.base_url);
    Ok(Executor::Llm(client))
}

/// Build an agent, falling back to the stub when the real one can't be made.
pub fn instantiate<A: Agent>(settings: &AgentSettings, credential: Option<&str>) -> A {
    let executor = match connect(settings, credential) {
        Ok(executor) => executor,
        Err(e) => {
            tracing::warn!(agent = %A::KIND, reason = %e, "Agent construction failed, using stub");
            Executor::Stub(StubResponder)
        }
    };
    A::with_executor(executor, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Deployer, Researcher, Writer};

    #[test]
    fn no_credential_falls_back_to_stub() {
        let settings = AgentSettings::default();
        let research: Researcher = instantiate(&settings, None);
        let writer: Writer = instantiate(&settings, None);
        let deploy: Deployer = instantiate(&settings, None);
        assert!(research.executor().is_stub());
        assert!(writer.executor().is_stub());
        assert!(deploy.executor().is_stub());
    }

    #[test]
    fn blank_credential_falls_back_to_stub() {
        let research: Researcher = instantiate(&AgentSettings::default(), Some("  "));
        assert!(research.executor().is_stub());
    }

    #[test]
    fn credential_builds_real_executor() {
        let research: Researcher = instantiate(&AgentSettings::default(), Some("sk-test"));
        assert!(!research.executor().is_stub());
    }

    #[test]
    fn bundled_templates_exist() {
        assert!(AgentSettings::bundled_templates_dir()
            .join(crate::writer::DOCUMENT_TEMPLATE)
            .is_file());
    }
}
