//! `opencursor agent`: run one task, or read tasks from stdin.

use opencursor_agent::AgentLoop;
use opencursor_core::message::ConversationStore;

use super::{CliResult, Overrides};

const HELP: &str = "\
  /agent <task>        run a task autonomously (same as typing the task)
  /interactive <task>  plan one step and approve each tool call
  /chat <message>      talk to the model directly (no tools)
  /tools               list available tools
  /help                show this help
  /exit                quit";

/// One line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Autonomous(&'a str),
    Interactive(&'a str),
    Chat(&'a str),
    Tools,
    Help,
    Exit,
    Empty,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> ReplCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return ReplCommand::Autonomous(line);
    };

    let (command, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(c, a)| (c, a.trim()))
        .unwrap_or((rest, ""));

    match command {
        "agent" if !arg.is_empty() => ReplCommand::Autonomous(arg),
        "interactive" if !arg.is_empty() => ReplCommand::Interactive(arg),
        "chat" if !arg.is_empty() => ReplCommand::Chat(arg),
        "tools" => ReplCommand::Tools,
        "help" => ReplCommand::Help,
        "exit" | "quit" => ReplCommand::Exit,
        _ => ReplCommand::Unknown(line),
    }
}

pub async fn run(overrides: &Overrides, query: Option<String>) -> CliResult {
    let config = super::load_config(overrides)?;
    let mut agent = super::build_agent(&config)?;
    let mut conversation = ConversationStore::new();

    if let Some(query) = query {
        let outcome = agent.run_autonomous(&mut conversation, &query).await?;
        println!("{outcome}");
        return Ok(());
    }

    println!();
    println!("  OpenCursor agent");
    println!("  Provider:  {}", config.provider);
    println!("  Model:     {}", config.model);
    println!("  Workspace: {}", config.workspace_root().display());
    println!("  Tools:     {}", agent.tools().len());
    if !agent.backend_reachable().await {
        println!("  Warning:   {} backend is not reachable", config.provider);
    }
    println!();
    println!("  Type a task and press Enter. /help for commands.");
    println!();

    while let Some(line) = super::prompt_line("  > ")? {
        match parse_line(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Exit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Tools => super::tools::print_tools(agent.tools()),
            ReplCommand::Unknown(cmd) => eprintln!("  Unknown command: {cmd} (try /help)"),
            ReplCommand::Autonomous(task) => {
                run_task(&mut agent, &mut conversation, task).await;
            }
            ReplCommand::Chat(message) => match agent.chat(&mut conversation, message).await {
                Ok(reply) => println!("{reply}"),
                Err(e) => eprintln!("  Error: {e}"),
            },
            ReplCommand::Interactive(task) => {
                if let Err(e) =
                    super::interactive::plan_and_approve(&mut agent, &mut conversation, task).await
                {
                    eprintln!("  Error: {e}");
                }
            }
        }
        println!();
    }

    println!("  Goodbye!");
    Ok(())
}

/// Errors are printed, not returned, so the REPL keeps going.
async fn run_task(agent: &mut AgentLoop, conversation: &mut ConversationStore, task: &str) {
    match agent.run_autonomous(conversation, task).await {
        Ok(outcome) => {
            println!();
            println!("{outcome}");
        }
        Err(e) => eprintln!("  Error: {e}"),
    }
}
