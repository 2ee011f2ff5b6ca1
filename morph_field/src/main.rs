//! Interactive headless morph console: switch shapes, hold a signal, run
//! ticks, and watch how far the field sits from its target.

use morph_field::{EngineConfig, MorphEngine};
use particle_shapes::{radius_stats, ShapeArchetype};
use std::io::{self, Write};

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║              Particle Morph Field Console                ║");
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();

    let count: usize = read_line("  Particles (default 4000): ")
        .trim().parse().unwrap_or(4000);
    let count = count.max(1).min(100_000);
    let start = pick_shape("  Start shape");

    let mut engine = MorphEngine::new(EngineConfig::default().particle_count(count), start);
    println!("\n  ✓  {}\n", status(&engine));

    loop {
        print_ops_menu();
        let choice = read_line("Command: ").trim().to_ascii_lowercase();

        match choice.as_str() {
            "1" => {
                let a = pick_shape("  Target shape");
                engine.set_archetype(a);
                println!("  Target is now {}.", a);
            }
            "2" => {
                let s: f32 = read_line("  Hand openness 0.0–1.0: ").trim().parse().unwrap_or(0.0);
                engine.set_signal(s);
                println!("  Signal held at {:.2}.", engine.signal());
            }
            "3" => {
                let n: usize = read_line("  Run N ticks (default 60): ").trim().parse().unwrap_or(60);
                let every = (n / 10).max(1);
                println!("    {:>6}  {:>10}  {:>10}  {:>10}", "tick", "mean→tgt", "max→tgt", "mean r");
                for i in 1..=n {
                    engine.tick();
                    if i % every == 0 || i == n {
                        println!("    {:>6}  {:>10.4}  {:>10.4}  {:>10.4}",
                                 engine.ticks(),
                                 engine.mean_distance_to_target(),
                                 engine.max_distance_to_target(),
                                 radius_stats(engine.live()).mean);
                    }
                }
            }
            "4" => {
                // open for `hold` ticks, then release for `release` ticks
                let hold: usize    = read_line("  Open-hand ticks (default 30): ").trim().parse().unwrap_or(30);
                let release: usize = read_line("  Release ticks (default 120): ").trim().parse().unwrap_or(120);
                engine.set_signal(1.0);
                for _ in 0..hold { engine.tick(); }
                let peak = radius_stats(engine.live()).max;
                engine.set_signal(0.0);
                for _ in 0..release { engine.tick(); }
                println!("  Peak radius {:.3}; after release mean→tgt {:.4}",
                         peak, engine.mean_distance_to_target());
            }
            "5" => {
                let r = engine.rotation();
                println!("  Rotation  y = {:.4} rad   z = {:.4} rad", r.y, r.z);
            }
            "6" => {
                println!("  {}", status(&engine));
            }
            "7" => {
                // teleport the live buffer; the active target is unchanged
                let a = pick_shape("  Snap onto shape");
                let points = engine.library().target(a).as_slice().to_vec();
                engine.place(&points);
                println!("  Live buffer now sits on {}; mean→tgt {:.4}",
                         a, engine.mean_distance_to_target());
            }
            "q" | "quit" => {
                println!("\nGoodbye!\n");
                break;
            }
            _ => println!("  ⚠  Unknown command."),
        }
        println!();
    }
}

fn status(engine: &MorphEngine) -> String {
    let stats = radius_stats(engine.live());
    format!(
        "{} particles → {}  signal={:.2}  tick={}  r=[{:.2}, {:.2}]",
        engine.live().len(), engine.archetype(), engine.signal(), engine.ticks(),
        stats.min, stats.max,
    )
}

fn print_ops_menu() {
    println!("  ┌─────────────────────────────────────────────────────────┐");
    println!("  │  1. Switch target shape       4. Pulse (open, release)  │");
    println!("  │  2. Hold a signal             5. Rotation               │");
    println!("  │  3. Run N ticks               6. Status                 │");
    println!("  │  7. Snap live buffer to shape q. Quit                   │");
    println!("  └─────────────────────────────────────────────────────────┘");
}

fn pick_shape(prompt: &str) -> ShapeArchetype {
    loop {
        for a in ShapeArchetype::ALL {
            println!("    {}. {}", a.index() + 1, a.name());
        }
        let picked = read_line(&format!("{} (1–5): ", prompt)).trim().parse::<usize>().ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(ShapeArchetype::from_index);
        match picked {
            Some(a) => break a,
            None    => println!("  ⚠  Please enter 1–5.\n"),
        }
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
