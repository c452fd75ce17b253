//! System prompts for the two task modes.
//!
//! Autonomous and interactive tasks are different contracts with the model,
//! not different wording: the first forbids asking the user anything, the
//! second requires a single proposed tool call per turn.

use opencursor_core::agent::TaskMode;
use opencursor_core::tool::ToolSchema;

const AUTONOMOUS_PROMPT: &str = "\
You are an autonomous coding agent. You are given a task and complete it on your own, \
step by step, using the tools provided. You work in a loop:

1. Break the task into small steps.
2. For each step, call the tool that fits it.
3. Read the tool output and plan the next step.
4. Repeat until the task is done.
5. Finish with a short summary of what you did.

You MUST NOT ask the user for clarification or more input. When information is missing, \
make a reasonable assumption and carry on.

Rules:
- Call a tool in every step until the task is complete.
- One action per tool call.
- Explore the workspace (list_dir, file_search, grep_search, read_file) before changing code.
- Edit files with edit_file or search_replace, never by printing code blocks.
- Run commands with run_terminal_cmd, never by printing them.
- Your final message must not contain tool calls.";

const INTERACTIVE_PROMPT: &str = "\
You are an interactive coding agent working step by step with the user. You are given a \
task and move it forward one step at a time, and the user approves every step.

1. Analyse the task and propose the next step.
2. Propose exactly ONE tool call and explain why.
3. The user approves or rejects it before anything runs.
4. After each result, explain it and propose the next step.

Rules:
- Never propose more than one tool call at a time.
- Explain your reasoning before the tool call.
- Be methodical and thorough.";

/// The system prompt for `mode`, followed by the tools on offer.
pub fn system_prompt(mode: TaskMode, tools: &[ToolSchema]) -> String {
    let base = match mode {
        TaskMode::Autonomous => AUTONOMOUS_PROMPT,
        TaskMode::Interactive => INTERACTIVE_PROMPT,
    };
    if tools.is_empty() {
        return base.to_string();
    }

    let mut prompt = format!("{base}\n\nAvailable tools:\n");
    for schema in tools {
        let params: Vec<String> = schema
            .parameters
            .iter()
            .map(|p| {
                if p.required {
                    p.name.clone()
                } else {
                    format!("{}?", p.name)
                }
            })
            .collect();
        prompt.push_str(&format!(
            "- {}({}): {}\n",
            schema.name,
            params.join(", "),
            schema.description
        ));
    }
    prompt.truncate(prompt.trim_end().len());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencursor_core::tool::{ParamSpec, ParamType};

    #[test]
    fn modes_have_distinct_contracts() {
        let autonomous = system_prompt(TaskMode::Autonomous, &[]);
        let interactive = system_prompt(TaskMode::Interactive, &[]);
        assert!(autonomous.contains("MUST NOT ask the user"));
        assert!(interactive.contains("exactly ONE tool call"));
        assert_ne!(autonomous, interactive);
    }

    #[test]
    fn tools_are_listed_in_order() {
        let tools = vec![
            ToolSchema::new("read_file", "Read a file")
                .param(ParamSpec::required("target_file", ParamType::String, ""))
                .param(ParamSpec::optional("offset", ParamType::Integer, "")),
            ToolSchema::new("list_dir", "List a directory"),
        ];
        let prompt = system_prompt(TaskMode::Autonomous, &tools);
        let read = prompt.find("- read_file(target_file, offset?): Read a file").unwrap();
        let list = prompt.find("- list_dir(): List a directory").unwrap();
        assert!(read < list);
        assert!(!prompt.ends_with('\n'));
    }
}
