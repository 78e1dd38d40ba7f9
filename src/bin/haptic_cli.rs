use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use haptic_pulse::config::AppConfig;
use haptic_pulse::error::{ErrorReport, ErrorSink};
use haptic_pulse::engine::{
    CompiledPattern, EngineOptions, HapticEngine, ImpactStyle, SimulatedBackend,
};
use haptic_pulse::pattern::{presets, HapticPattern};
use haptic_pulse::player::PatternPlayer;
use haptic_pulse::telemetry::{self, TelemetrySnapshot};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "haptic_cli",
    about = "Play haptic patterns against the simulated haptics backend"
)]
struct Cli {
    /// JSON configuration file (defaults to assets/haptic_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a preset or a JSON pattern file and print a report
    Play {
        #[arg(long, conflicts_with = "pattern", required_unless_present = "pattern")]
        preset: Option<String>,
        /// JSON array of events
        #[arg(long)]
        pattern: Option<PathBuf>,
        /// Block until the pattern has finished playing
        #[arg(long)]
        wait: bool,
    },
    /// List available presets
    Presets,
    /// Trigger the plain vibration alert
    Vibrate,
    /// Trigger a single impact tap
    Impact {
        #[arg(long, value_enum, default_value_t = ImpactArg::Medium)]
        style: ImpactArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ImpactArg {
    Light,
    Medium,
    Heavy,
    Soft,
    Rigid,
}

impl From<ImpactArg> for ImpactStyle {
    fn from(arg: ImpactArg) -> Self {
        match arg {
            ImpactArg::Light => ImpactStyle::Light,
            ImpactArg::Medium => ImpactStyle::Medium,
            ImpactArg::Heavy => ImpactStyle::Heavy,
            ImpactArg::Soft => ImpactStyle::Soft,
            ImpactArg::Rigid => ImpactStyle::Rigid,
        }
    }
}

#[derive(Serialize)]
struct PlayReport<'a> {
    source: &'a str,
    playback_id: u64,
    event_count: usize,
    duration_s: f64,
    finished: bool,
    compiled: Option<&'a CompiledPattern>,
    diagnostics: TelemetrySnapshot,
}

#[derive(Serialize)]
struct PresetSummary<'a> {
    name: &'a str,
    event_count: usize,
    duration_s: f64,
}

#[derive(Serialize)]
struct FeedbackReport {
    feedback: String,
    delivered: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .map(AppConfig::load_from_file)
        .unwrap_or_else(AppConfig::load);
    telemetry::init_hub(&config.telemetry);

    match cli.command {
        Commands::Play {
            preset,
            pattern,
            wait,
        } => run_play(&config, preset, pattern, wait),
        Commands::Presets => run_presets(),
        Commands::Vibrate => run_feedback(&config, None),
        Commands::Impact { style } => run_feedback(&config, Some(style.into())),
    }
}

fn build_engine(config: &AppConfig) -> (HapticEngine, Arc<SimulatedBackend>) {
    let backend =
        Arc::new(SimulatedBackend::new().with_max_events(config.simulator.max_events));
    backend.set_supported(config.simulator.supports_haptics);

    let engine = HapticEngine::with_options(
        backend.clone(),
        EngineOptions {
            config: config.engine.clone(),
            error_sink: Arc::new(CollectorSink),
            ..EngineOptions::default()
        },
    );
    (engine, backend)
}

/// Routes engine errors into the process-wide collector.
struct CollectorSink;

impl ErrorSink for CollectorSink {
    fn record(&self, report: ErrorReport) {
        telemetry::hub().record(report);
    }
}

fn load_pattern(preset: Option<String>, path: Option<PathBuf>) -> Result<(String, HapticPattern)> {
    match (preset, path) {
        (Some(name), _) => match presets::by_name(&name) {
            Some(pattern) => Ok((name, pattern)),
            None => bail!(
                "unknown preset '{}' (available: {})",
                name,
                presets::PRESET_NAMES.join(", ")
            ),
        },
        (None, Some(path)) => {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("reading pattern file {}", path.display()))?;
            let pattern: HapticPattern = serde_json::from_str(&contents)
                .with_context(|| format!("parsing pattern file {}", path.display()))?;
            Ok((path.display().to_string(), pattern))
        }
        (None, None) => bail!("either --preset or --pattern is required"),
    }
}

fn run_play(
    config: &AppConfig,
    preset: Option<String>,
    pattern_path: Option<PathBuf>,
    wait: bool,
) -> Result<ExitCode> {
    let (source, pattern) = load_pattern(preset, pattern_path)?;
    let (engine, backend) = build_engine(config);
    let mut lifecycle = engine.subscribe_lifecycle();

    engine.start().context("starting haptic engine")?;

    let player = PatternPlayer::new();
    let handle = player
        .play(&engine, &pattern)
        .with_context(|| format!("playing {}", source))?;
    telemetry::hub().record_playback(&handle);

    if wait {
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(10));
        }
    }

    engine.stop();
    while let Ok(event) = lifecycle.try_recv() {
        telemetry::hub().record_lifecycle(&event);
    }

    let compiled = backend.compiled_patterns();
    let report = PlayReport {
        source: &source,
        playback_id: handle.id().value(),
        event_count: handle.event_count(),
        duration_s: handle.duration(),
        finished: handle.is_finished(),
        compiled: compiled.last(),
        diagnostics: telemetry::hub().snapshot(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(ExitCode::from(0))
}

fn run_presets() -> Result<ExitCode> {
    for name in presets::PRESET_NAMES {
        if let Some(pattern) = presets::by_name(name) {
            let summary = PresetSummary {
                name,
                event_count: pattern.len(),
                duration_s: pattern.duration(),
            };
            println!("{}", serde_json::to_string(&summary)?);
        }
    }
    Ok(ExitCode::from(0))
}

fn run_feedback(config: &AppConfig, style: Option<ImpactStyle>) -> Result<ExitCode> {
    let (engine, backend) = build_engine(config);
    let label = match style {
        Some(style) => {
            engine.impact(style).context("impact feedback")?;
            format!("impact:{:?}", style).to_lowercase()
        }
        None => {
            engine
                .play_alert_vibration()
                .context("alert vibration")?;
            "alert_vibration".to_string()
        }
    };

    let report = FeedbackReport {
        feedback: label,
        delivered: backend.feedback_records().len(),
    };
    println!("{}", serde_json::to_string(&report)?);
    Ok(ExitCode::from(0))
}
