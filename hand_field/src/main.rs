//! hand_field — interactive entry point.

use anyhow::Context;
use clap::Parser;
use hand_field::app::{run, AppConfig, MAX_PARTICLES};
use hand_field::palette::PRESET;
use morph_field::Rgb;
use particle_shapes::{ShapeArchetype, DEFAULT_PARTICLE_COUNT};
use std::io::{self, Write};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Skip the prompts and start with defaults
    #[arg(long, default_value_t = false)]
    quick: bool,

    /// Starting shape (heart, flower, saturn, firework, sphere)
    #[arg(long)]
    shape: Option<ShapeArchetype>,

    /// Particle color as #RRGGBB
    #[arg(long)]
    color: Option<String>,

    /// Number of particles
    #[arg(long)]
    particles: Option<usize>,

    /// Seed for the shape targets
    #[arg(long)]
    seed: Option<u64>,
}

impl Args {
    fn any_set(&self) -> bool {
        self.shape.is_some() || self.color.is_some() || self.particles.is_some() || self.seed.is_some()
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Hand Field — Gesture Controlled Particles           ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Keyboard simulation  (use --features leap for hardware)");
    println!();

    let cfg = if args.quick || args.any_set() {
        from_args(&args)?
    } else {
        configure_interactively()
    };

    println!();
    println!("  Opening visualizer window…");
    println!();

    run(cfg).context("visualizer stopped")
}

fn from_args(args: &Args) -> anyhow::Result<AppConfig> {
    let mut cfg = AppConfig::default().seed(args.seed);
    if let Some(shape) = args.shape {
        cfg = cfg.shape(shape);
    }
    if let Some(hex) = &args.color {
        cfg = cfg.color(Rgb::from_hex(hex)?);
    }
    let n = args.particles.unwrap_or(DEFAULT_PARTICLE_COUNT);
    Ok(cfg.particles(n)?)
}

fn configure_interactively() -> AppConfig {
    let shape = pick_shape();
    let color = pick_color();

    let mut cfg = AppConfig::default().shape(shape).color(color);
    loop {
        let n = read_line(&format!("  Particles (default {}): ", DEFAULT_PARTICLE_COUNT))
            .trim().parse().unwrap_or(DEFAULT_PARTICLE_COUNT);
        match cfg.clone().particles(n) {
            Ok(c)  => { cfg = c; break; }
            Err(_) => println!("    ⚠  1–{} only.", MAX_PARTICLES),
        }
    }

    let seed = read_line("  Seed (blank for random): ").trim().parse::<u64>().ok();
    cfg.seed(seed)
}

fn pick_shape() -> ShapeArchetype {
    println!("  Starting shape:");
    println!("    1.Heart  2.Flower  3.Saturn  4.Firework  5.Orb");
    read_line("    Choice (1–5, default 1): ").trim().parse::<usize>().ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(ShapeArchetype::from_index)
        .unwrap_or(ShapeArchetype::Heart)
}

fn pick_color() -> Rgb {
    println!("  Particle color:");
    println!("    1.Pink  2.Cyan  3.Gold  4.Lime  5.White   or #RRGGBB");
    loop {
        let answer = read_line("    Choice (default 1): ");
        let answer = answer.trim();
        if answer.starts_with('#') {
            match Rgb::from_hex(answer) {
                Ok(c)  => break c,
                Err(e) => { println!("    ⚠  {}", e); continue; }
            }
        }
        let i = answer.parse::<usize>().ok().and_then(|n| n.checked_sub(1)).unwrap_or(0);
        break PRESET.get(i).copied().unwrap_or(PRESET[0]);
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
