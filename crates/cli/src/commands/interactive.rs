//! `opencursor interactive`: one planned step, each tool call approved by hand.

use opencursor_agent::AgentLoop;
use opencursor_core::message::ConversationStore;

use super::{CliResult, Overrides};

pub async fn run(overrides: &Overrides, query: &str) -> CliResult {
    let config = super::load_config(overrides)?;
    let mut agent = super::build_agent(&config)?;
    let mut conversation = ConversationStore::new();
    plan_and_approve(&mut agent, &mut conversation, query).await
}

/// Ask the model for a plan, then offer each proposed call for approval.
pub async fn plan_and_approve(
    agent: &mut AgentLoop,
    conversation: &mut ConversationStore,
    task: &str,
) -> CliResult {
    let plan = agent.run_interactive(conversation, task).await?;

    println!();
    println!("{plan}");

    if plan.proposed_calls.is_empty() {
        return Ok(());
    }

    println!();
    for call in plan.proposed_calls {
        let question = format!("  Execute {}({})? [y/N] ", call.tool_name, call.arguments);
        let Some(answer) = super::prompt_line(&question)? else {
            break;
        };
        if !is_yes(&answer) {
            println!("  Skipped {}", call.tool_name);
            continue;
        }

        let result = agent.execute_approved(conversation, call).await?;
        println!();
        println!("{}", result.output);
        println!();
    }
    Ok(())
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
