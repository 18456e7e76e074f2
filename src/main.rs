use belay::commands::SettingKey;
use belay::keys::KeyAction;
use belay::{Host, HostCommand, HostRequest, Setting, logging, readline};
use belay_core::{Mode, SettingsExt, TimerSettings};
use clap::{Parser, Subcommand};
use std::io::Write;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), String> {
    let _log_guard = logging::init();

    let settings = TimerSettings::load();
    let (tx, rx) = mpsc::channel(16);
    let host = tokio::spawn(Host::new(settings).run(rx));

    loop {
        let line = tokio::task::spawn_blocking(readline)
            .await
            .map_err(|e| e.to_string())??;
        let Some(line) = line else {
            // stdin closed
            send(&tx, HostCommand::Shutdown).await.ok();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match respond(line, &tx).await {
            Ok(quit) => {
                if quit {
                    break;
                }
            }
            Err(err) => {
                write!(std::io::stdout(), "{err}").map_err(|e| e.to_string())?;
                std::io::stdout().flush().map_err(|e| e.to_string())?;
            }
        }
    }

    host.await.map_err(|e| e.to_string())?;
    Ok(())
}

#[derive(Parser)]
#[command(version, about = "climbing competition countdown")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new countdown from the presets
    Start {
        #[arg(short, long)]
        mode: Option<Mode>,
        #[arg(short, long)]
        climb_minutes: Option<u32>,
        #[arg(short, long)]
        transition_secs: Option<u32>,
    },
    Pause,
    Resume,
    /// Pause when running, resume when paused
    Toggle,
    Stop,
    Status,
    /// Change a preset or toggle
    Set { key: SettingKey, value: String },
    Config,
    TestBeep,
    /// Press a shortcut key: space, s or f
    Key { name: String },
    Exit,
}

async fn respond(line: &str, tx: &mpsc::Sender<HostRequest>) -> Result<bool, String> {
    let mut args = shlex::split(line).ok_or("error: Invalid quoting")?;
    args.insert(0, "belay".to_string());
    let cli = Cli::try_parse_from(args).map_err(|e| e.to_string())?;

    let command = match cli.command {
        Some(Commands::Start {
            mode,
            climb_minutes,
            transition_secs,
        }) => HostCommand::Start {
            mode,
            climb_minutes,
            transition_secs,
        },
        Some(Commands::Pause) => HostCommand::Pause,
        Some(Commands::Resume) => HostCommand::Resume,
        Some(Commands::Toggle) => HostCommand::Toggle,
        Some(Commands::Stop) => HostCommand::Stop,
        Some(Commands::Status) => HostCommand::Status,
        Some(Commands::Set { key, value }) => HostCommand::Set(Setting::parse(key, &value)?),
        Some(Commands::Config) => HostCommand::Config,
        Some(Commands::TestBeep) => HostCommand::TestBeep,
        Some(Commands::Key { name }) => HostCommand::Key(name.parse::<KeyAction>()?),
        Some(Commands::Exit) => HostCommand::Shutdown,
        None => return Ok(false),
    };

    let quit = command == HostCommand::Shutdown;
    let message = send(tx, command).await??;
    write!(std::io::stdout(), "{message}").map_err(|e| e.to_string())?;
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    Ok(quit)
}

async fn send(
    tx: &mpsc::Sender<HostRequest>,
    command: HostCommand,
) -> Result<Result<String, String>, String> {
    let (request, reply) = HostRequest::new(command);
    tx.send(request)
        .await
        .map_err(|_| "timer host has stopped".to_string())?;
    reply.await.map_err(|_| "timer host dropped the request".to_string())
}
