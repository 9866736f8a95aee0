//! Macropad simulator
//!
//! Runs the ripplepad engine on the host against a scripted key and encoder
//! timeline. Frames are drawn to the terminal and HID commands are logged
//! instead of sent.
//!
//! Usage: cargo run -p ripplepad-sim -- [OPTIONS]
//!
//! A script is a JSON list of timestamped steps:
//!
//! ```text
//! [
//!   {"at_ms": 200, "key": 0, "pressed": true},
//!   {"at_ms": 900, "turn": -2},
//!   {"at_ms": 1500, "button": true}
//! ]
//! ```

mod output;

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use ripplepad_lib::replay::{replay_script, ScriptStep};
use ripplepad_lib::{
    run_cooperative, Command, LogLevel, Macropad, PackedSettings, PadConfig, ReplayDial, ReplayKeys,
};

use crate::output::{LoggingSink, TerminalStrip};

type SimPad = Macropad<LoggingSink, PackedSettings>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// One async loop per concern on a single-threaded runtime
    Cooperative,
    /// A single tick function called in a tight loop
    Polled,
}

/// Simulate the ripplepad macropad in the terminal.
#[derive(Parser, Debug)]
#[command(name = "ripplepad-sim", version, about)]
struct Args {
    /// JSON configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON input script (built-in demo when omitted)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Scheduling discipline
    #[arg(short, long, value_enum, default_value_t = Mode::Cooperative)]
    mode: Mode,

    /// How long to run, in milliseconds
    #[arg(short, long, default_value = "3000")]
    duration_ms: u64,

    /// Don't print frames
    #[arg(short, long)]
    quiet: bool,
}

fn setup_logging(level: LogLevel) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level.as_level_filter())));

    fmt().with_env_filter(filter).with_target(false).init();
}

fn level_directive(filter: LevelFilter) -> &'static str {
    match filter {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}

fn load_config(path: Option<&Path>) -> Result<PadConfig> {
    let Some(path) = path else {
        return Ok(PadConfig::default());
    };
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

fn load_script(path: Option<&Path>) -> Result<Vec<ScriptStep>> {
    let Some(path) = path else {
        return Ok(demo_script());
    };
    let json = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
}

/// Tap, rocker, menu round trip and a chord.
fn demo_script() -> Vec<ScriptStep> {
    let key = |at_ms, id, pressed| ScriptStep::Key {
        at_ms,
        key: id,
        pressed,
    };
    vec![
        key(300, 5, true),
        key(450, 5, false),
        key(900, 0, true),
        key(960, 1, true),
        key(1010, 0, false),
        key(1080, 1, false),
        // Open the menu, select volume, close it, then turn the volume up
        ScriptStep::Button { at_ms: 1300, button: true },
        ScriptStep::Turn { at_ms: 1600, turn: 1 },
        ScriptStep::Button { at_ms: 1700, button: true },
        ScriptStep::Turn { at_ms: 2100, turn: -3 },
        key(2400, 10, true),
        key(2420, 11, true),
        key(2600, 10, false),
        key(2610, 11, false),
    ]
}

fn run_polled(
    mut pad: SimPad,
    keys: &mut ReplayKeys,
    dial: &mut ReplayDial,
    strip: &mut TerminalStrip,
    duration_ms: u64,
) -> SimPad {
    let start = Instant::now();
    pad.start(keys, dial, 0);
    loop {
        let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        if now_ms > duration_ms {
            break;
        }
        pad.tick_sync(now_ms, keys, dial, strip);
        std::thread::sleep(Duration::from_millis(1));
    }
    pad
}

fn run_async(
    pad: SimPad,
    keys: &mut ReplayKeys,
    dial: &mut ReplayDial,
    strip: &mut TerminalStrip,
    duration_ms: u64,
) -> Result<SimPad> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building runtime")?;
    let pad = RefCell::new(pad);
    runtime.block_on(async {
        // run_cooperative never finishes on its own
        let _ = tokio::time::timeout(
            Duration::from_millis(duration_ms),
            run_cooperative(&pad, keys, dial, strip),
        )
        .await;
    });
    Ok(pad.into_inner())
}

fn print_summary(pad: &SimPad, strip: &TerminalStrip) {
    use ripplepad_lib::SettingsStore;

    let sink = pad.mute().sink();
    println!("frames rendered: {}", strip.frames());
    for command in [Command::Mute, Command::Unmute, Command::VolumeUp, Command::VolumeDown] {
        let name = command.to_string();
        println!("{name:>10} ({}): {}", command.code(), sink.count(command));
    }
    let state = if pad.mute().muted() {
        "muted"
    } else {
        "unmuted"
    };
    println!(
        "final state: {state}, brightness {:.2}, hour offset {}, mode {}",
        pad.settings().brightness(),
        pad.settings().hour_offset(),
        pad.settings().selected(),
    );
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    setup_logging(config.log_level);
    config.validate();
    let baked = config.bake().context("invalid configuration")?;

    let steps = load_script(args.script.as_deref())?;
    info!("Loaded {} script steps", steps.len());
    let (mut keys, mut dial) = replay_script(&steps);
    let mut strip = TerminalStrip::new(args.quiet);

    let pad = Macropad::new(baked, LoggingSink::default(), PackedSettings::default());
    info!("Running {:?} for {} ms", args.mode, args.duration_ms);
    let pad = match args.mode {
        Mode::Cooperative => run_async(pad, &mut keys, &mut dial, &mut strip, args.duration_ms)?,
        Mode::Polled => run_polled(pad, &mut keys, &mut dial, &mut strip, args.duration_ms),
    };

    print_summary(&pad, &strip);
    Ok(())
}
