use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};
use serde::Serialize;

#[cfg(feature = "server")]
use patchboard::serve::{ServeArgs, run_serve};
use patchboard::{BoardSnapshot, EditorSession, InputEvent, RenderCommand};

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputSource {
    Stdin,
    File(PathBuf),
}

#[derive(Debug, Clone)]
enum OutputDestination {
    Stdout,
    File(PathBuf),
}

#[derive(Debug, Parser)]
#[command(
    name = "patchboard",
    about = "Replay a diagram event script through the patchboard engine, or serve the interactive editor API."
)]
pub struct ReplayArgs {
    /// Path to the JSON event script. Use '-' to read from stdin.
    #[arg(short = 'i', long = "input")]
    input: Option<String>,

    /// Path to the report output. Use '-' to write to stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Launch the interactive editor API instead of replaying once. An
    /// event script given with --input seeds the board first.
    #[arg(long = "edit", action = ArgAction::SetTrue, conflicts_with = "output")]
    edit: bool,

    /// Override the host binding when using --edit.
    #[arg(long = "serve-host", requires = "edit")]
    serve_host: Option<String>,

    /// Override the port binding when using --edit.
    #[arg(long = "serve-port", requires = "edit")]
    serve_port: Option<u16>,

    /// Directory with a prebuilt editor UI to serve alongside the API.
    #[arg(long = "ui-root", requires = "edit")]
    ui_root: Option<PathBuf>,

    /// Suppress informational output.
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    commands: Vec<RenderCommand>,
    board: BoardSnapshot,
}

#[cfg(feature = "server")]
pub async fn run_replay_or_edit(cli: ReplayArgs) -> Result<()> {
    if cli.edit {
        run_edit(cli).await
    } else {
        run_replay(cli)
    }
}

#[cfg(not(feature = "server"))]
pub fn run_replay_or_edit_sync(cli: ReplayArgs) -> Result<()> {
    if cli.edit {
        bail!("--edit requires the 'server' feature to be enabled");
    }
    run_replay(cli)
}

#[cfg(feature = "server")]
async fn run_edit(cli: ReplayArgs) -> Result<()> {
    let mut session = EditorSession::new();

    if cli.input.is_some() {
        let source = parse_input(cli.input.as_deref())?;
        let events = load_events(&source)?;
        let applied = apply_events(&mut session, &events)?;
        if !cli.quiet {
            println!("Seeded session from {} event(s)", applied);
        }
    }

    if let Some(root) = &cli.ui_root {
        if !root.join("index.html").is_file() {
            bail!("--ui-root '{}' does not contain an index.html", root.display());
        }
    }

    let host = cli
        .serve_host
        .clone()
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = cli.serve_port.unwrap_or(5151);

    let serve_args = ServeArgs {
        host: host.clone(),
        port,
    };

    println!("Launching editor session {}", session.id);
    println!(
        "Visit http://{}:{} in your browser to begin editing",
        host, port
    );

    run_serve(serve_args, session, cli.ui_root.clone()).await
}

fn run_replay(cli: ReplayArgs) -> Result<()> {
    let input_source = parse_input(cli.input.as_deref())?;
    let output_dest = parse_output(cli.output.as_deref())?;

    let events = load_events(&input_source)?;
    let mut session = EditorSession::new();
    let mut commands = Vec::new();

    for (index, event) in events.iter().enumerate() {
        let mut batch = session
            .handle_event(event.clone())
            .with_context(|| format!("event #{} referenced a stale id", index + 1))?;
        commands.append(&mut batch);
    }

    let report = ReplayReport {
        commands,
        board: session
            .snapshot()
            .map_err(|err| anyhow!("failed to snapshot the board: {err}"))?,
    };

    let mut json = serde_json::to_string_pretty(&report)?;
    json.push('\n');

    // When the report itself goes to stdout, the summary would corrupt it.
    let to_stdout = matches!(output_dest, OutputDestination::Stdout);
    write_output(output_dest, json.as_bytes(), cli.quiet)?;
    if !cli.quiet && !to_stdout {
        println!(
            "Replayed {} event(s) -> {} node(s), {} connection(s)",
            events.len(),
            report.board.nodes.len(),
            report.board.connections.len()
        );
    }

    Ok(())
}

#[cfg(feature = "server")]
fn apply_events(session: &mut EditorSession, events: &[InputEvent]) -> Result<usize> {
    for (index, event) in events.iter().enumerate() {
        session
            .handle_event(event.clone())
            .with_context(|| format!("event #{} referenced a stale id", index + 1))?;
    }
    Ok(events.len())
}

fn parse_input(input: Option<&str>) -> Result<InputSource> {
    match input {
        Some("-") => Ok(InputSource::Stdin),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if !path.exists() {
                return Err(anyhow!("input file '{path_str}' does not exist"));
            }
            Ok(InputSource::File(path))
        }
        None => Ok(InputSource::Stdin),
    }
}

fn parse_output(output: Option<&str>) -> Result<OutputDestination> {
    match output {
        Some("-") | None => Ok(OutputDestination::Stdout),
        Some(path_str) => {
            let path = PathBuf::from(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(anyhow!(
                        "output directory '{}' does not exist",
                        parent.display()
                    ));
                }
            }
            Ok(OutputDestination::File(path))
        }
    }
}

fn load_events(source: &InputSource) -> Result<Vec<InputEvent>> {
    let contents = match source {
        InputSource::Stdin => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            if buffer.trim().is_empty() {
                bail!("no event script supplied on stdin");
            }
            buffer
        }
        InputSource::File(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            if contents.trim().is_empty() {
                bail!("input file '{}' was empty", path.display());
            }
            contents
        }
    };

    serde_json::from_str(&contents).context("failed to parse the event script")
}

fn write_output(dest: OutputDestination, bytes: &[u8], quiet: bool) -> Result<()> {
    match dest {
        OutputDestination::Stdout => {
            let mut stdout = io::stdout();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
        OutputDestination::File(path) => {
            fs::write(&path, bytes)?;
            if !quiet {
                println!("Wrote replay report -> {}", path.display());
            }
        }
    }
    Ok(())
}
