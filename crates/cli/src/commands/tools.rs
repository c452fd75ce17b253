//! `opencursor tools`: list the built-in tools.

use opencursor_core::tool::{ToolRegistry, ToolSchema};

use super::{CliResult, Overrides};

pub fn run(overrides: &Overrides) -> CliResult {
    let config = super::load_config(overrides)?;
    let registry = super::build_registry(&config)?;
    print_tools(&registry);
    Ok(())
}

pub fn print_tools(registry: &ToolRegistry) {
    for schema in registry.all_schemas() {
        println!("{}", render(&schema));
    }
}

fn render(schema: &ToolSchema) -> String {
    let params: Vec<String> = schema
        .parameters
        .iter()
        .map(|p| {
            let marker = if p.required { "" } else { "?" };
            format!("{}{marker}: {}", p.name, p.ty.as_str())
        })
        .collect();
    format!(
        "  {}({})\n      {}",
        schema.name,
        params.join(", "),
        schema.description
    )
}
