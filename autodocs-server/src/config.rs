//! Command line / environment configuration.

use std::path::PathBuf;

use autodocs_agents::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use autodocs_agents::AgentSettings;
use clap::Parser;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

#[derive(Parser, Debug, Clone)]
#[command(name = "autodocs-server", about = "Run research, writer and deployment agents over local repositories")]
pub struct ServerConfig {
    /// Address for the HTTP API (host:port)
    #[arg(long, env = "AUTODOCS_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: String,

    /// Port override; replaces the port of --listen-addr
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Default API key for requests that don't carry one
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Model used by the real agents
    #[arg(long, env = "AUTODOCS_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the chat-completions API
    #[arg(long, env = "AUTODOCS_LLM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub llm_base_url: String,

    /// Directory with the writer's Markdown templates
    #[arg(long, env = "AUTODOCS_TEMPLATES_DIR")]
    pub templates_dir: Option<PathBuf>,

    /// Document path used when a request has no output_path
    /// (default: <cwd>/docs/auto_docs.md)
    #[arg(long, env = "AUTODOCS_DEFAULT_OUTPUT")]
    pub default_output: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            port: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            llm_base_url: DEFAULT_BASE_URL.to_string(),
            templates_dir: None,
            default_output: None,
        }
    }
}

impl ServerConfig {
    /// Listen address with the port override applied.
    pub fn bind_addr(&self) -> String {
        match self.port {
            Some(port) => {
                let host = self
                    .listen_addr
                    .rsplit_once(':')
                    .map(|(host, _)| host)
                    .unwrap_or(&self.listen_addr);
                format!("{host}:{port}")
            }
            None => self.listen_addr.clone(),
        }
    }

    pub fn agent_settings(&self) -> AgentSettings {
        AgentSettings {
            templates_dir: self
                .templates_dir
                .clone()
                .unwrap_or_else(AgentSettings::bundled_templates_dir),
            model: self.model.clone(),
            base_url: self.llm_base_url.clone(),
        }
    }

    /// Where a document goes when the request doesn't say.
    pub fn default_output_path(&self) -> PathBuf {
        if let Some(path) = &self.default_output {
            return path.clone();
        }
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("docs")
            .join("auto_docs.md")
    }
}
