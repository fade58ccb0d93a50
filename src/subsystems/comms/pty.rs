//! PTY (console) channel: reads commands from stdin, runs them against the
//! [`Agent`], prints the result to stdout.
//!
//! One command at a time: each line is awaited to completion before the next
//! is read. Runs until the `shutdown` token is cancelled (Ctrl-C), stdin is
//! closed, or the user types `exit`. Logs go to stderr, so they never
//! interleave with the output written here.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::subsystems::agents::Agent;

use super::command::{self, Command};

/// Whether the loop keeps reading after a command.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Run the console on the process's stdin/stdout.
pub async fn run(agent: &mut Agent, shutdown: CancellationToken) -> Result<(), AppError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_with(agent, stdin, &mut stdout, shutdown, true).await
}

/// Drive the read-eval-print loop over any line source and sink.
pub async fn run_with<R, W>(
    agent: &mut Agent,
    input: R,
    out: &mut W,
    shutdown: CancellationToken,
    interactive: bool,
) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    info!("pty channel started");
    if interactive {
        writeln!(out, "─────────────────────────────────")?;
        writeln!(out, " ollama-cli-agent  (type 'help', Ctrl-C to quit)")?;
        writeln!(out, "─────────────────────────────────")?;
    }

    let mut lines = input.lines();

    loop {
        if interactive {
            write!(out, "You> ")?;
            out.flush()?;
        }

        let line = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out)?;
                info!("pty channel shutting down");
                break;
            }

            line = lines.next_line() => line,
        };

        let input = match line {
            Err(e) => {
                warn!("pty read error: {e}");
                break;
            }
            Ok(None) => {
                info!("pty stdin closed");
                break;
            }
            Ok(Some(input)) => input,
        };

        let Some(cmd) = Command::parse(&input) else { continue };
        debug!(?cmd, "pty command");

        let flow = tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                writeln!(out, "\ninterrupted")?;
                info!("pty channel shutting down mid-command");
                break;
            }

            flow = dispatch(agent, cmd, out) => flow?,
        };

        if flow == Flow::Exit {
            writeln!(out, "Goodbye!")?;
            break;
        }
    }

    Ok(())
}

/// Run one command and print its outcome. Agent errors are printed, never
/// propagated; only output failures end the loop.
async fn dispatch<W: Write>(agent: &mut Agent, cmd: Command, out: &mut W) -> Result<Flow, AppError> {
    let text = match cmd {
        Command::Exit => return Ok(Flow::Exit),
        Command::Help => command::HELP.to_string(),
        Command::Usage(usage) => usage.to_string(),
        Command::Unknown(verb) => command::unknown_hint(&verb),
        Command::Ask(question) => match agent.ask(&question).await {
            Ok(answer) => command::render_answer(&answer),
            Err(e) => command::render_error(&e),
        },
        Command::Ingest(Some(input)) => match agent.ingest(&input).await {
            Ok(outcome) => command::render_ingest(&outcome),
            Err(e) => command::render_error(&e),
        },
        Command::Ingest(None) => match agent.ingest_last().await {
            Ok(outcome) => command::render_ingest(&outcome),
            Err(e) => command::render_error(&e),
        },
        Command::Search(query) => match agent.search(&query).await {
            Ok(outcome) => command::render_search(&query, &outcome),
            Err(e) => command::render_error(&e),
        },
        Command::Fetch(url) => command::render_page(&agent.fetch(&url).await),
        Command::Stats { json } => match agent.stats().await {
            Ok(stats) => command::render_stats(&stats, json),
            Err(e) => command::render_error(&e),
        },
    };
    writeln!(out, "{text}\n")?;
    Ok(Flow::Continue)
}
