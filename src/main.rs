use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aria_assistant::commands::{CommandExecutor, CommandParser, SpecExtras};
use aria_assistant::voice::{AudioPlayback, SpeechToText, TextToSpeech, TriggerDetector};
use aria_assistant::{Config, ExecutionResult};

/// Aria - Voice command interpreter for a personal AI assistant
#[derive(Parser)]
#[command(name = "aria", version, about)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, env = "ARIA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the command table path
    #[arg(long, env = "ARIA_COMMANDS_FILE")]
    commands_file: Option<PathBuf>,

    /// OpenAI API key for the voice collaborators
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive loop: read transcriptions from stdin and execute them
    Run {
        /// Only act on lines carrying a trigger phrase (stripped before parsing)
        #[arg(long)]
        require_trigger: bool,

        /// Speak responses through TTS
        #[arg(long)]
        speak: bool,
    },
    /// Execute a single transcription
    Exec {
        /// Transcription text
        text: String,
    },
    /// Transcribe a WAV file and execute the transcript
    Transcribe {
        /// Path to a WAV recording of one utterance
        file: PathBuf,
    },
    /// Synthesize text and play it (TTS smoke test)
    Speak {
        /// Text to speak
        #[arg(default_value = "All systems online.")]
        text: String,
    },
    /// Inspect or extend the command table
    Commands {
        #[command(subcommand)]
        action: CommandsAction,
    },
}

#[derive(Subcommand)]
enum CommandsAction {
    /// Print the active command table
    List,
    /// Add or extend a command type
    Add {
        /// Command-type name
        #[arg(long = "type")]
        cmd_type: String,

        /// Regex pattern (repeatable, tried in order)
        #[arg(long = "pattern", required = true)]
        patterns: Vec<String>,

        /// Handler function name
        #[arg(long)]
        function: String,

        /// App alias in name=target form (repeatable)
        #[arg(long = "app", value_parser = parse_app_alias)]
        apps: Vec<(String, String)>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info",
        1 => "info,aria_assistant=debug",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.commands_file {
        config.commands_path = path;
    }
    if let Some(key) = cli.openai_api_key {
        config.voice.openai_api_key = Some(key);
    }

    match cli.command {
        Command::Run {
            require_trigger,
            speak,
        } => run_loop(&config, require_trigger, speak).await,
        Command::Exec { text } => {
            let mut executor = build_executor(&config)?;
            print_result(&executor.execute(&text))
        }
        Command::Transcribe { file } => transcribe_and_execute(&config, &file).await,
        Command::Speak { text } => speak_text(&config, &text).await,
        Command::Commands { action } => manage_commands(&config, action),
    }
}

/// Interactive driver loop over stdin transcriptions
async fn run_loop(config: &Config, require_trigger: bool, speak: bool) -> anyhow::Result<()> {
    let mut executor = build_executor(config)?;
    let trigger = TriggerDetector::new(config.trigger_phrases.clone());

    let voice = if speak {
        let key = config.require_openai_key()?;
        Some((
            TextToSpeech::new(
                key.to_string(),
                config.voice.tts_model.clone(),
                config.voice.tts_voice.clone(),
                config.voice.tts_speed,
            )?,
            AudioPlayback::new()?,
        ))
    } else {
        None
    };

    println!("All systems online. Type a command, Ctrl-D to exit.");

    for line in std::io::stdin().lines() {
        let line = line.context("reading stdin")?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let text = if require_trigger {
            match trigger.strip(text) {
                Some(rest) if !rest.is_empty() => rest,
                _ => {
                    tracing::debug!("no trigger phrase, ignoring line");
                    continue;
                }
            }
        } else {
            text.to_string()
        };

        let result = executor.execute(&text);
        print_result(&result)?;

        if let Some((tts, playback)) = &voice {
            let response = spoken_response(&result);
            match tts.synthesize(&response).await {
                Ok(audio) => {
                    if let Err(e) = playback.play_wav(&audio) {
                        tracing::warn!(error = %e, "playback failed");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "synthesis failed"),
            }
        }
    }

    Ok(())
}

/// Transcribe a recorded utterance, then execute the transcript
async fn transcribe_and_execute(config: &Config, file: &PathBuf) -> anyhow::Result<()> {
    let key = config.require_openai_key()?;
    let stt = SpeechToText::new(key.to_string(), config.voice.stt_model.clone())?;

    let audio = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let transcript = stt.transcribe(&audio).await?;

    if transcript.is_empty() {
        println!("(nothing transcribed)");
        return Ok(());
    }

    println!("transcript: {transcript}");
    let mut executor = build_executor(config)?;
    print_result(&executor.execute(&transcript))
}

/// Synthesize and play a line of text
async fn speak_text(config: &Config, text: &str) -> anyhow::Result<()> {
    let key = config.require_openai_key()?;
    let tts = TextToSpeech::new(
        key.to_string(),
        config.voice.tts_model.clone(),
        config.voice.tts_voice.clone(),
        config.voice.tts_speed,
    )?;

    let audio = tts.synthesize(text).await?;
    AudioPlayback::new()?.play_wav(&audio)?;
    Ok(())
}

/// List or extend the persisted command table
fn manage_commands(config: &Config, action: CommandsAction) -> anyhow::Result<()> {
    let mut parser = CommandParser::from_path(&config.commands_path)?;

    match action {
        CommandsAction::List => {
            println!("{}", serde_json::to_string_pretty(parser.table().specs())?);
        }
        CommandsAction::Add {
            cmd_type,
            patterns,
            function,
            apps,
        } => {
            let extras = SpecExtras {
                apps: if apps.is_empty() {
                    None
                } else {
                    Some(apps.into_iter().collect())
                },
                types: None,
            };
            parser.add_command(&cmd_type, patterns, &function, extras)?;
            println!("added command type {cmd_type}");
        }
    }

    Ok(())
}

fn build_executor(config: &Config) -> anyhow::Result<CommandExecutor> {
    let parser = CommandParser::from_path(&config.commands_path)
        .with_context(|| format!("loading command table {}", config.commands_path.display()))?;
    Ok(CommandExecutor::new(parser))
}

fn print_result(result: &ExecutionResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

/// One spoken line summarizing an execution result
fn spoken_response(result: &ExecutionResult) -> String {
    if !result.success {
        return "I did not quite understand what you wanted.".to_string();
    }

    let record = result.result.as_ref();
    let field = |key: &str| {
        record
            .and_then(|r| r.get(key))
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    match result.command_data.command.as_str() {
        "open" => format!("I have opened {}.", field("target")),
        "web_search" => format!("Searching the web for {}.", field("query")),
        "system" => format!("Initiating system {}.", field("action")),
        "wifi" => format!("Okay, {}ing the WiFi.", field("action")),
        "timer" => {
            let duration = record
                .and_then(|r| r.get("duration"))
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default();
            format!("Timer set for {} {}s.", duration, field("unit"))
        }
        _ if record.is_some_and(|r| r["status"] == "not_implemented") => {
            "I can't do that yet.".to_string()
        }
        _ => "Done.".to_string(),
    }
}

/// Parse a `name=target` app alias argument
fn parse_app_alias(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(name, target)| (name.to_string(), target.to_string()))
        .ok_or_else(|| format!("expected name=target, got {s:?}"))
}
