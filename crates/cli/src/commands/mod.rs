//! Subcommands and the wiring they share.

pub mod agent;
pub mod config_cmd;
pub mod interactive;
pub mod tools;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use opencursor_agent::AgentLoop;
use opencursor_config::AppConfig;
use opencursor_core::event::{DomainEvent, EventBus};
use opencursor_core::tool::ToolRegistry;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Global flags; each one set wins over config file and environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub model: Option<String>,
    pub host: Option<String>,
    pub provider: Option<String>,
    pub workspace: Option<PathBuf>,
    pub max_iterations: Option<u32>,
}

impl Overrides {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if let Some(workspace) = &self.workspace {
            config.workspace = Some(workspace.clone());
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
    }
}

/// Config file + environment + flags, validated.
pub fn load_config(overrides: &Overrides) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

pub fn build_registry(config: &AppConfig) -> Result<Arc<ToolRegistry>, Box<dyn std::error::Error>> {
    let registry = opencursor_tools::default_registry(&config.workspace_root(), &config.tools)?;
    Ok(Arc::new(registry))
}

/// Gateway, tools and agent loop from `config`, with live progress on stderr.
pub fn build_agent(config: &AppConfig) -> Result<AgentLoop, Box<dyn std::error::Error>> {
    let gateway = opencursor_providers::build_from_config(config);
    let tools = build_registry(config)?;

    let event_bus = Arc::new(EventBus::default());
    spawn_progress_printer(&event_bus);

    Ok(AgentLoop::new(gateway, tools, config.model.clone())
        .with_max_iterations(config.max_iterations)
        .with_temperature(config.temperature)
        .with_event_bus(event_bus))
}

fn spawn_progress_printer(bus: &EventBus) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            };
            match event.as_ref() {
                DomainEvent::ToolStarted {
                    tool_name, summary, ..
                } => eprintln!("  Calling tool: {tool_name} ({summary})"),
                DomainEvent::ToolExecuted {
                    tool_name,
                    success: false,
                    ..
                } => eprintln!("  Tool {tool_name} failed"),
                DomainEvent::ResponseGenerated {
                    iteration,
                    tool_calls,
                    ..
                } if *tool_calls > 0 => {
                    eprintln!("  Step {iteration}: {tool_calls} tool call(s)")
                }
                _ => {}
            }
        }
    });
}

/// Print `prompt` and read one trimmed line from stdin. `None` on EOF.
pub fn prompt_line(prompt: &str) -> std::io::Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
