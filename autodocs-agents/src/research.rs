//! Research agent: what is in this repository?

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::deployment::Deployment;
use crate::executor::{AgentTask, Executor};
use crate::factory::{Agent, AgentKind, AgentSettings};
use crate::tools;

const ARCHITECTURE_TASK: &str = "You are a principal engineer. Describe the architecture of this \
repository in one short paragraph: major components, how they interact, and the overall style. \
Reference actual file names.";

const PATTERNS_TASK: &str = "You are a senior engineer reviewing code structure. List the design \
patterns used in this repository, one per line, names only, no numbering.";

/// Output of the research stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub repo_path: String,
    pub files: Vec<String>,
    pub file_count: usize,
    pub languages: BTreeMap<String, usize>,
    pub key_files: Vec<String>,
    pub architecture: String,
    pub design_patterns: Vec<String>,
    /// Filled in after the deployment stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<Deployment>,
}

#[async_trait]
pub trait RepositoryAnalyzer: Send + Sync {
    async fn analyze_repository(&self, repo_path: &Path) -> Result<Analysis>;
}

pub struct Researcher {
    executor: Executor,
}

impl Researcher {
    pub fn executor(&self) -> &Executor {
        &self.executor
    }
}

impl Agent for Researcher {
    const KIND: AgentKind = AgentKind::Research;

    fn with_executor(executor: Executor, _settings: &AgentSettings) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl RepositoryAnalyzer for Researcher {
    async fn analyze_repository(&self, repo_path: &Path) -> Result<Analysis> {
        let root: PathBuf = repo_path.to_path_buf();
        let (scan, excerpts) = tokio::task::spawn_blocking(move || {
            let scan = tools::scan_repository(&root);
            let excerpts = tools::key_file_excerpts(&root, &scan.key_files);
            (scan, excerpts)
        })
        .await
        .context("Repository scan panicked")?;

        tracing::info!(
            repo = %repo_path.display(),
            files = scan.file_count,
            languages = scan.languages.len(),
            "Repository scanned"
        );

        let context = format!(
            "## File Tree\n```\n{}\n```\n\n## Key File Contents\n{excerpts}",
            scan.files.join("\n")
        );

        let architecture = self
            .executor
            .execute_task(&AgentTask::new(ARCHITECTURE_TASK, context.clone()))
            .await
            .context("Architecture analysis failed")?;

        let patterns = self
            .executor
            .execute_task(&AgentTask::new(PATTERNS_TASK, context))
            .await
            .context("Design pattern analysis failed")?;

        Ok(Analysis {
            repo_path: repo_path.display().to_string(),
            files: scan.files,
            file_count: scan.file_count,
            languages: scan.languages,
            key_files: scan.key_files,
            architecture: architecture.trim().to_string(),
            design_patterns: parse_list(&patterns),
            deployment: None,
        })
    }
}

/// One entry per non-empty line, bullets and numbering stripped.
pub(crate) fn parse_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(['-', '*', '•'])
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}
