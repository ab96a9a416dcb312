//! touch_switch_sim — interactive entry point.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use touch_switch::SwitchConfig;
use touch_switch_sim::app::{run, sim_defaults, AppConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "touch_switch_sim", about = "Touch switch simulator")]
struct Cli {
    /// TOML switch configuration; skips the interactive prompts.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Gesture mode.
    #[arg(long, value_enum)]
    mode: Option<Mode>,

    /// Switch radius in meters.
    #[arg(long)]
    radius: Option<f32>,

    /// Start with defaults, no prompts.
    #[arg(long)]
    quick: bool,

    /// Do not open a MIDI port for the sound cue.
    #[arg(long)]
    mute: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Simple,
    Knob,
    Directional,
    Wheel,
}

impl Mode {
    fn apply(self, cfg: &mut SwitchConfig) {
        cfg.modes.knob        = self == Mode::Knob;
        cfg.modes.directional = self == Mode::Directional;
        cfg.modes.wheel       = self == Mode::Wheel;
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("touch_switch=info,touch_switch_sim=info")),
        )
        .init();

    let cli = Cli::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Touch Switch — finger-touch gesture simulator       ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Hands: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Hands: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let mut switch = match &cli.config {
        Some(path) => SwitchConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None if cli.quick || cli.mode.is_some() || cli.radius.is_some() => sim_defaults(),
        None => configure_interactively(),
    };

    if let Some(mode) = cli.mode {
        mode.apply(&mut switch);
    }
    if let Some(radius) = cli.radius {
        switch.dimensions.radius = radius;
    }
    switch.validate().context("invalid switch configuration")?;

    if cli.mute {
        switch.feedback.sound_cue = false;
    }

    let with_audio = switch.feedback.sound_cue;
    let cfg = AppConfig { switch, with_audio };

    println!("  Opening visualizer window…");
    println!();

    run(cfg).map_err(anyhow::Error::msg)
}

fn configure_interactively() -> SwitchConfig {
    let mut cfg = sim_defaults();

    println!("  Gesture mode:");
    println!("    1.Simple  2.Knob  3.Directional  4.Wheel  5.Knob+Directional");
    match read_line("    Choice (1–5, default 1): ").trim() {
        "2" => Mode::Knob.apply(&mut cfg),
        "3" => Mode::Directional.apply(&mut cfg),
        "4" => Mode::Wheel.apply(&mut cfg),
        "5" => {
            Mode::Knob.apply(&mut cfg);
            cfg.modes.directional = true;
        }
        _   => Mode::Simple.apply(&mut cfg),
    }

    cfg.dimensions.radius = loop {
        let r = read_line("  Radius in cm (default 0.75): ")
            .trim().parse::<f32>().unwrap_or(0.75);
        if r > 0.0 && r <= 50.0 { break r / 100.0; }
        println!("    ⚠  0–50 cm only.");
    };

    if cfg.modes.knob {
        cfg.modes.knob_step_deg = read_line("  Knob step degrees (default 10): ")
            .trim().parse::<f32>().unwrap_or(10.0).clamp(1.0, 90.0);
    }
    if cfg.modes.wheel {
        cfg.modes.wheel_step_deg = read_line("  Wheel step degrees (default 1): ")
            .trim().parse::<f32>().unwrap_or(1.0).clamp(0.1, 90.0);
    }

    cfg.touch.grip = read_line("  Require grip trigger? (y/N): ")
        .trim().eq_ignore_ascii_case("y");

    cfg
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
