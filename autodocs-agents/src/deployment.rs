//! Deployment agent: container, orchestration and CI configuration for an
//! analysed repository.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::executor::{AgentTask, Executor};
use crate::factory::{Agent, AgentKind, AgentSettings};
use crate::research::Analysis;

const DOCKERFILE_TASK: &str = "You are a DevOps engineer. Write a production Dockerfile for this \
project. Output only the file contents.";

const KUBERNETES_TASK: &str = "You are a platform engineer. Write Kubernetes manifests (Deployment \
and Service) for this project as YAML. Output only the YAML.";

const CI_CD_TASK: &str = "You are a release engineer. Write a CI/CD pipeline definition that \
builds, tests and publishes this project. Output only the pipeline file.";

const ENV_VARS_TASK: &str = "List the environment variables this project needs at runtime, \
comma separated, names only.";

/// Output of the deployment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub dockerfile: String,
    pub kubernetes: String,
    pub ci_cd: String,
    pub environment_variables: Vec<String>,
}

#[async_trait]
pub trait DeploymentPlanner: Send + Sync {
    async fn generate_deployment_config(&self, analysis: &Analysis) -> Result<Deployment>;
}

pub struct Deployer {
    executor: Executor,
}

impl Deployer {
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    async fn ask(&self, description: &str, context: &str, what: &str) -> Result<String> {
        let answer = self
            .executor
            .execute_task(&AgentTask::new(description, context))
            .await
            .with_context(|| format!("Generating {what} failed"))?;
        Ok(answer.trim().to_string())
    }
}

impl Agent for Deployer {
    const KIND: AgentKind = AgentKind::Deployment;

    fn with_executor(executor: Executor, _settings: &AgentSettings) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl DeploymentPlanner for Deployer {
    async fn generate_deployment_config(&self, analysis: &Analysis) -> Result<Deployment> {
        let context = project_summary(analysis);

        let dockerfile = self.ask(DOCKERFILE_TASK, &context, "Dockerfile").await?;
        let kubernetes = self.ask(KUBERNETES_TASK, &context, "Kubernetes manifests").await?;
        let ci_cd = self.ask(CI_CD_TASK, &context, "CI/CD pipeline").await?;
        let env_vars = self.ask(ENV_VARS_TASK, &context, "environment variables").await?;

        Ok(Deployment {
            dockerfile,
            kubernetes,
            ci_cd,
            environment_variables: parse_names(&env_vars),
        })
    }
}

fn project_summary(analysis: &Analysis) -> String {
    let languages = analysis
        .languages
        .iter()
        .map(|(lang, count)| format!("{lang} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Repository: {}\nLanguages: {languages}\nKey files: {}\nArchitecture: {}\nPatterns: {}",
        analysis.repo_path,
        analysis.key_files.join(", "),
        analysis.architecture,
        analysis.design_patterns.join(", "),
    )
}

/// Split a comma or newline separated answer into names.
fn parse_names(text: &str) -> Vec<String> {
    text.split([',', '\n'])
        .map(|s| s.trim().trim_start_matches(['-', '*']).trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubResponder;
    use std::collections::BTreeMap;

    fn analysis() -> Analysis {
        Analysis {
            repo_path: "/tmp/repo".into(),
            files: vec!["app.py".into()],
            file_count: 1,
            languages: BTreeMap::from([("Python".to_string(), 1)]),
            key_files: vec!["app.py".into()],
            architecture: "monolith".into(),
            design_patterns: vec!["Factory".into()],
            deployment: None,
        }
    }

    #[tokio::test]
    async fn stub_deployment_hits_each_rule() {
        let deployer =
            Deployer::with_executor(Executor::Stub(StubResponder), &AgentSettings::default());
        let deployment = deployer.generate_deployment_config(&analysis()).await.unwrap();
        assert_eq!(deployment.dockerfile, "# Dockerfile\nFROM python:3.11-slim\n# ...");
        assert_eq!(deployment.kubernetes, "apiVersion: v1\nkind: Service\n# ...");
        assert_eq!(deployment.ci_cd, "# CI/CD pipeline stub");
        assert_eq!(deployment.environment_variables, vec!["DATABASE_URL", "REDIS_URL"]);
    }

    #[test]
    fn names_split_on_commas_and_lines() {
        assert_eq!(
            parse_names("A, B\n- C\n\n,D"),
            vec!["A", "B", "C", "D"]
        );
    }
}
