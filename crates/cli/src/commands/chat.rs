use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use stayfinder_agent::{
    AgentRuntime, AgentSettings, ChatMessage, Conversation, OpenAiClient, ToolRegistry,
};
use stayfinder_core::config::AppConfig;
use stayfinder_core::{BookingDesk, BookingRules, Catalog};
use tracing::{info, warn};
use uuid::Uuid;

use crate::commands::{load_options, CommandResult};
use crate::init_logging;

const EXIT_WORDS: [&str; 3] = ["quit", "exit", "bye"];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub turns: usize,
    pub failed_turns: usize,
}

pub fn run(config_path: Option<PathBuf>) -> CommandResult {
    let config = match AppConfig::load(load_options(config_path)) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("chat", "config_validation", error.to_string(), 2);
        }
    };
    init_logging(&config.logging);

    let mut agent = match build_agent(&config) {
        Ok(agent) => agent,
        Err(error) => {
            return CommandResult::failure("chat", "agent_init", format!("{error:#}"), 3);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "chat",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                4,
            );
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    match runtime.block_on(run_session(&mut agent, stdin.lock(), &mut stdout)) {
        Ok(summary) => CommandResult::success(
            "chat",
            format!(
                "session ended after {} turn(s), {} failed, {} booking(s) made",
                summary.turns,
                summary.failed_turns,
                agent.desk().ledger().len()
            ),
        ),
        Err(error) => CommandResult::failure("chat", "console_io", error.to_string(), 5),
    }
}

pub fn build_agent(config: &AppConfig) -> Result<AgentRuntime> {
    let llm = OpenAiClient::from_config(&config.llm).context("failed to build completion client")?;
    let tools = ToolRegistry::with_booking_tools().context("failed to register booking tools")?;
    let desk = BookingDesk::new(
        Catalog::seeded(),
        BookingRules { require_positive_stay: config.booking.require_positive_stay },
    );

    info!(
        event_name = "chat.agent.ready",
        provider = ?config.llm.provider,
        model = %llm.model(),
        endpoint = %llm.endpoint(),
        max_tool_rounds = config.agent.max_tool_rounds,
        "booking agent initialized"
    );

    Ok(AgentRuntime::new(Arc::new(llm), tools, desk, AgentSettings::from_config(&config.agent)))
}

/// Drives the console conversation until an exit word or end of input. A
/// failed turn is reported and the session continues with its history
/// intact.
pub async fn run_session<R, W>(
    agent: &mut AgentRuntime,
    input: R,
    output: &mut W,
) -> io::Result<SessionSummary>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "Hotel Booking AI Agent")?;
    writeln!(output, "{}", "=".repeat(50))?;
    writeln!(output, "Ask me to search hotels or make a booking!")?;
    writeln!(output, "Type 'quit' to exit")?;

    let mut conversation = Conversation::new();
    let mut summary = SessionSummary::default();
    let mut lines = input.lines();

    loop {
        write!(output, "\nYou: ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            break;
        };
        let line = line?;
        let text = line.trim();

        if is_exit_command(text) {
            writeln!(output, "Thank you for using the Hotel Booking Agent! Goodbye!")?;
            break;
        }
        if text.is_empty() {
            continue;
        }

        summary.turns += 1;
        let correlation_id = Uuid::new_v4().to_string();
        let turn_start = conversation.len();
        let outcome = agent.handle_correlated_turn(&mut conversation, text, &correlation_id).await;
        render_tool_calls(output, &conversation.messages()[turn_start..])?;

        match outcome {
            Ok(reply) => writeln!(output, "\nAgent: {reply}")?,
            Err(error) => {
                summary.failed_turns += 1;
                let message = error.to_string();
                let interface = error.into_application().into_interface(correlation_id);
                warn!(
                    event_name = "chat.turn.failed",
                    correlation_id = %interface.correlation_id(),
                    error = %interface,
                    "turn failed"
                );
                writeln!(output, "\nError: {message}")?;
            }
        }
    }

    Ok(summary)
}

/// Echoes the tool calls a turn requested, ahead of its reply or error.
fn render_tool_calls<W: Write>(output: &mut W, turn: &[ChatMessage]) -> io::Result<()> {
    for call in turn.iter().flat_map(|message| &message.tool_calls) {
        writeln!(output, "\nCalling function: {}", call.function.name)?;
        writeln!(output, "   Arguments: {}", call.function.arguments)?;
    }
    Ok(())
}

fn is_exit_command(text: &str) -> bool {
    EXIT_WORDS.iter().any(|word| text.eq_ignore_ascii_case(word))
}
