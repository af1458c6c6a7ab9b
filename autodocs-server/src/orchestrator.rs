//! Research → write → deploy, recorded in the task store.
//!
//! Stages run strictly in order and the first failure ends the run. Results
//! from stages that finished stay on the record; the failure is stored as
//! `status = error` with the error chain as message. Nothing propagates to
//! the caller.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use autodocs_agents::{
    instantiate, AgentSettings, Analysis, Deployer, DeploymentPlanner, DocumentationWriter,
    RepositoryAnalyzer, Researcher, Writer,
};

use crate::store::{TaskPatch, TaskStatus, TaskStore};

pub struct Pipeline {
    store: Arc<dyn TaskStore>,
    settings: AgentSettings,
}

impl Pipeline {
    pub fn new(store: Arc<dyn TaskStore>, settings: AgentSettings) -> Self {
        Self { store, settings }
    }

    /// Run all three stages for a queued task.
    ///
    /// Agents are built per run; each one independently falls back to the
    /// stub when `credential` can't produce a real client. Returns the final
    /// analysis (with deployment attached) when the run completes.
    pub async fn run(
        &self,
        task_id: &str,
        repo_path: &str,
        output_path: &str,
        credential: Option<&str>,
    ) -> Option<Analysis> {
        self.record(task_id, TaskPatch::status(TaskStatus::Running));

        let research: Researcher = instantiate(&self.settings, credential);
        let writer: Writer = instantiate(&self.settings, credential);
        let deployer: Deployer = instantiate(&self.settings, credential);

        self.drive(
            task_id,
            Path::new(repo_path),
            Path::new(output_path),
            &research,
            &writer,
            &deployer,
        )
        .await
    }

    /// Same as [`Pipeline::run`] with caller-supplied agents.
    pub async fn run_with(
        &self,
        task_id: &str,
        repo_path: &Path,
        output_path: &Path,
        research: &dyn RepositoryAnalyzer,
        writer: &dyn DocumentationWriter,
        deployer: &dyn DeploymentPlanner,
    ) -> Option<Analysis> {
        self.record(task_id, TaskPatch::status(TaskStatus::Running));
        self.drive(task_id, repo_path, output_path, research, writer, deployer)
            .await
    }

    async fn drive(
        &self,
        task_id: &str,
        repo_path: &Path,
        output_path: &Path,
        research: &dyn RepositoryAnalyzer,
        writer: &dyn DocumentationWriter,
        deployer: &dyn DeploymentPlanner,
    ) -> Option<Analysis> {
        tracing::info!(task_id, repo = %repo_path.display(), "Pipeline started");
        match self
            .stages(task_id, repo_path, output_path, research, writer, deployer)
            .await
        {
            Ok(analysis) => {
                tracing::info!(task_id, "Pipeline finished");
                Some(analysis)
            }
            Err(e) => {
                tracing::warn!(task_id, error = %format!("{e:#}"), "Pipeline failed");
                self.record(task_id, TaskPatch::failed(format!("{e:#}")));
                None
            }
        }
    }

    async fn stages(
        &self,
        task_id: &str,
        repo_path: &Path,
        output_path: &Path,
        research: &dyn RepositoryAnalyzer,
        writer: &dyn DocumentationWriter,
        deployer: &dyn DeploymentPlanner,
    ) -> Result<Analysis> {
        tracing::debug!(task_id, stage = "research", "Stage started");
        let mut analysis = research.analyze_repository(repo_path).await?;
        self.record(
            task_id,
            TaskPatch {
                research: Some(serde_json::to_value(&analysis).context("Encoding analysis failed")?),
                ..TaskPatch::default()
            },
        );

        tracing::debug!(task_id, stage = "write", "Stage started");
        writer.generate_documentation(&analysis, output_path).await?;
        self.record(
            task_id,
            TaskPatch {
                markdown_path: Some(output_path.display().to_string()),
                ..TaskPatch::default()
            },
        );

        tracing::debug!(task_id, stage = "deploy", "Stage started");
        let deployment = deployer.generate_deployment_config(&analysis).await?;
        let encoded = serde_json::to_value(&deployment).context("Encoding deployment failed")?;
        analysis.deployment = Some(deployment);
        self.record(
            task_id,
            TaskPatch {
                status: Some(TaskStatus::Done),
                deployment: Some(encoded),
                ..TaskPatch::default()
            },
        );

        Ok(analysis)
    }

    fn record(&self, task_id: &str, patch: TaskPatch) {
        if let Err(e) = self.store.update(task_id, patch) {
            tracing::warn!(task_id, error = %e, "Task update rejected");
        }
    }
}
