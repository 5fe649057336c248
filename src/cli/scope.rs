//! taskmate agents / projects command implementation

use super::Context;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};

#[derive(serde::Serialize)]
struct AgentsReport {
    agents: Vec<String>,
}

#[derive(serde::Serialize)]
struct ProjectsReport<'a> {
    agent_id: &'a str,
    projects: Vec<String>,
}

pub fn run_agents(context: Context) -> Result<()> {
    let agents = context.store.storage().list_agents();

    let mut human = HumanOutput::new("Agents");
    human.push_summary("count", agents.len().to_string());
    for agent in &agents {
        human.push_detail(agent.clone());
    }

    emit_success(context.output, "agents", &AgentsReport { agents }, Some(&human))
}

pub fn run_projects(context: Context, agent: &str) -> Result<()> {
    let projects = context.store.storage().list_projects(agent);

    let mut human = HumanOutput::new(format!("Projects for {agent}"));
    human.push_summary("count", projects.len().to_string());
    for project in &projects {
        human.push_detail(project.clone());
    }
    if projects.is_empty() && !context.store.storage().root().join(agent).is_dir() {
        human.push_warning(format!("no agent directory for '{agent}'"));
    }

    let report = ProjectsReport {
        agent_id: agent,
        projects,
    };
    emit_success(context.output, "projects", &report, Some(&human))
}
