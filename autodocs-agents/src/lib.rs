//! autodocs-agents: the agents behind the autodocs pipeline.
//!
//! Three agents work over a local repository:
//! - Research: scans the tree and describes architecture and patterns
//! - Writer: renders a Markdown document from the analysis
//! - Deployment: proposes Dockerfile, Kubernetes, CI/CD and env settings
//!
//! Every agent sends its prompts through an [`executor::Executor`], which is
//! either an LLM client or the deterministic [`stub::StubResponder`]. The
//! [`factory`] picks one and never fails.

pub mod deployment;
pub mod executor;
pub mod factory;
pub mod llm;
pub mod research;
pub mod stub;
pub mod tools;
pub mod writer;

pub use deployment::{Deployer, Deployment, DeploymentPlanner};
pub use executor::{AgentTask, Executor};
pub use factory::{instantiate, Agent, AgentKind, AgentSettings};
pub use research::{Analysis, RepositoryAnalyzer, Researcher};
pub use stub::StubResponder;
pub use writer::{DocumentationWriter, Writer};
