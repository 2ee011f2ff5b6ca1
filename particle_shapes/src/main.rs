//! Interactive menu for exploring the five shape distributions.
//! Prints radius statistics and a front-view density sketch.

use particle_shapes::{ShapeArchetype, ShapeGenerator, DEFAULT_PARTICLE_COUNT};
use std::io::{self, Write};

const PLOT_W: usize = 64;
const PLOT_H: usize = 28;

fn main() {
    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║           Particle Shape Distribution Explorer       ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let mut rng = rand::rng();

    loop {
        print_menu();
        let choice = read_line("Select a shape (1–5, or q to quit): ");

        if choice.trim().eq_ignore_ascii_case("q") {
            println!("\nGoodbye!\n");
            break;
        }

        let archetype = match choice.trim().parse::<usize>().ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(ShapeArchetype::from_index)
        {
            Some(a) => a,
            None    => { println!("  ⚠  Please enter 1–5 or q.\n"); continue; }
        };

        let n: usize = read_line(&format!("  How many points? (default {}): ", DEFAULT_PARTICLE_COUNT))
            .trim().parse().unwrap_or(DEFAULT_PARTICLE_COUNT);
        let n = n.max(1).min(200_000);

        let jitter = !read_line("  Apply jitter? (Y/n): ").trim().eq_ignore_ascii_case("n");
        let gen = if jitter {
            ShapeGenerator::new(n)
        } else {
            ShapeGenerator::new(n).jitter(0.0)
        };

        let buf   = gen.generate(archetype, &mut rng);
        let stats = buf.radius_stats();

        println!();
        println!("  ┌─ {} ({} points{}) ─", archetype, buf.len(),
                 if jitter { ", jittered" } else { "" });
        println!("  │  radius min  : {:.4}", stats.min);
        println!("  │  radius mean : {:.4}", stats.mean);
        println!("  │  radius max  : {:.4}", stats.max);
        println!("  │");
        for row in density_sketch(buf.as_slice()) {
            println!("  │  {}", row);
        }
        println!("  └─");
        println!();
    }
}

fn print_menu() {
    println!("  ┌──────────────────────────────────────┐");
    for a in ShapeArchetype::ALL {
        println!("  │  {}. {:<34}│", a.index() + 1, a.name());
    }
    println!("  └──────────────────────────────────────┘");
}

/// Project onto the XY plane and shade each cell by how many points land in it.
fn density_sketch(points: &[glam::Vec3]) -> Vec<String> {
    const SHADES: &[u8] = b" .:-=+*#%@";

    let extent = points.iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0_f32, f32::max)
        .max(1e-3);

    let mut grid = vec![0u32; PLOT_W * PLOT_H];
    for p in points {
        let cx = ((p.x / extent + 1.0) * 0.5 * (PLOT_W - 1) as f32).round() as usize;
        let cy = ((1.0 - (p.y / extent + 1.0) * 0.5) * (PLOT_H - 1) as f32).round() as usize;
        grid[cy.min(PLOT_H - 1) * PLOT_W + cx.min(PLOT_W - 1)] += 1;
    }

    let peak = grid.iter().copied().max().unwrap_or(0).max(1) as f32;
    grid.chunks(PLOT_W)
        .map(|row| row.iter()
            .map(|&c| {
                let level = ((c as f32 / peak).sqrt() * (SHADES.len() - 1) as f32).round() as usize;
                SHADES[level.min(SHADES.len() - 1)] as char
            })
            .collect())
        .collect()
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
