//! Writer agent: renders the analysis into a Markdown document.
//!
//! Rendering goes through a minijinja environment whose loader reads
//! templates from the configured directory. If the document template is not
//! there, the copy compiled into this crate is used, so a stub writer can
//! always produce a document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use minijinja::{context, Environment, ErrorKind};

use crate::executor::{AgentTask, Executor};
use crate::factory::{Agent, AgentKind, AgentSettings};
use crate::research::Analysis;

/// Name of the document template inside the templates directory.
pub const DOCUMENT_TEMPLATE: &str = "documentation.md.j2";

const BUILTIN_TEMPLATE: &str = include_str!("../templates/documentation.md.j2");

const OVERVIEW_TASK: &str = "You are a technical writer. Write a concise overview of this project \
for its documentation: what it does and how the code is organised. Two paragraphs at most.";

#[async_trait]
pub trait DocumentationWriter: Send + Sync {
    async fn generate_documentation(&self, analysis: &Analysis, output_path: &Path) -> Result<()>;
}

pub struct Writer {
    executor: Executor,
    templates: Environment<'static>,
}

impl Writer {
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Render the document without touching the filesystem.
    pub fn render(&self, analysis: &Analysis, overview: &str) -> Result<String> {
        let template = self
            .templates
            .get_template(DOCUMENT_TEMPLATE)
            .context("Loading documentation template failed")?;
        let rendered = template
            .render(context! {
                title => project_title(&analysis.repo_path),
                overview => overview,
                analysis => analysis,
                generated_at => chrono::Utc::now().format("%Y-%m-%d %H:%M UTC").to_string(),
            })
            .context("Rendering documentation failed")?;
        Ok(rendered)
    }
}

impl Agent for Writer {
    const KIND: AgentKind = AgentKind::Writer;

    fn with_executor(executor: Executor, settings: &AgentSettings) -> Self {
        Self {
            executor,
            templates: template_environment(&settings.templates_dir),
        }
    }
}

#[async_trait]
impl DocumentationWriter for Writer {
    async fn generate_documentation(&self, analysis: &Analysis, output_path: &Path) -> Result<()> {
        let context = format!(
            "Architecture: {}\nDesign patterns: {}\nKey files: {}\nFiles:\n{}",
            analysis.architecture,
            analysis.design_patterns.join(", "),
            analysis.key_files.join(", "),
            analysis.files.join("\n"),
        );
        let overview = self
            .executor
            .execute_task(&AgentTask::new(OVERVIEW_TASK, context))
            .await
            .context("Writing overview failed")?;

        let document = self.render(analysis, overview.trim())?;

        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(output_path, &document)
            .await
            .with_context(|| format!("Failed to write {}", output_path.display()))?;

        tracing::info!(
            path = %output_path.display(),
            bytes = document.len(),
            "Documentation written"
        );
        Ok(())
    }
}

/// Template environment reading from `dir`, with the bundled document
/// template as fallback.
pub fn template_environment(dir: &Path) -> Environment<'static> {
    let dir: PathBuf = dir.to_path_buf();
    let mut env = Environment::new();
    env.set_loader(move |name| match std::fs::read_to_string(dir.join(name)) {
        Ok(source) => Ok(Some(source)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok((name == DOCUMENT_TEMPLATE).then(|| BUILTIN_TEMPLATE.to_string()))
        }
        Err(e) => Err(minijinja::Error::new(
            ErrorKind::InvalidOperation,
            format!("could not read template {name}"),
        )
        .with_source(e)),
    });
    env
}

fn project_title(repo_path: &str) -> String {
    Path::new(repo_path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Project documentation".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deployment::Deployment;
    use crate::stub::StubResponder;
    use std::collections::BTreeMap;

    fn analysis() -> Analysis {
        Analysis {
            repo_path: "/work/shop".into(),
            files: vec!["app.py".into(), "Dockerfile".into()],
            file_count: 2,
            languages: BTreeMap::from([("Python".to_string(), 1), ("Docker".to_string(), 1)]),
            key_files: vec!["Dockerfile".into(), "app.py".into()],
            architecture: "Single Flask service.".into(),
            design_patterns: vec!["Factory".into()],
            deployment: None,
        }
    }

    fn stub_writer(templates_dir: &Path) -> Writer {
        let settings = AgentSettings {
            templates_dir: templates_dir.to_path_buf(),
            ..AgentSettings::default()
        };
        Writer::with_executor(Executor::Stub(StubResponder), &settings)
    }

    #[tokio::test]
    async fn writes_document_creating_parent_dirs() {
        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("docs/nested/auto_docs.md");
        let writer = stub_writer(&AgentSettings::bundled_templates_dir());

        writer.generate_documentation(&analysis(), &path).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# shop"));
        assert!(text.contains("Stubbed result"));
        assert!(text.contains("Single Flask service."));
        assert!(text.contains("- Factory"));
        assert!(text.contains("| Python | 1 |"));
        assert!(!text.contains("## Deployment"));
    }

    #[test]
    fn missing_template_dir_uses_builtin() {
        let writer = stub_writer(Path::new("/no/such/templates"));
        let doc = writer.render(&analysis(), "overview").unwrap();
        assert!(doc.contains("## Architecture"));
    }

    #[test]
    fn template_dir_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DOCUMENT_TEMPLATE),
            "custom {{ title }}: {{ analysis.architecture }}",
        )
        .unwrap();
        let writer = stub_writer(dir.path());
        let doc = writer.render(&analysis(), "ignored").unwrap();
        assert_eq!(doc, "custom shop: Single Flask service.");
    }

    #[test]
    fn deployment_section_rendered_when_present() {
        let mut analysis = analysis();
        analysis.deployment = Some(Deployment {
            dockerfile: "FROM python".into(),
            kubernetes: "kind: Service".into(),
            ci_cd: "on: push".into(),
            environment_variables: vec!["DATABASE_URL".into()],
        });
        let writer = stub_writer(&AgentSettings::bundled_templates_dir());
        let doc = writer.render(&analysis, "o").unwrap();
        assert!(doc.contains("## Deployment"));
        assert!(doc.contains("- `DATABASE_URL`"));
    }

    #[tokio::test]
    async fn unwritable_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let writer = stub_writer(&AgentSettings::bundled_templates_dir());
        let err = writer
            .generate_documentation(&analysis(), &blocker.join("doc.md"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to create"));
    }
}
