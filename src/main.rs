use std::time::Duration;

use clap::{Parser, ValueEnum};

pub use utils::Pos;
mod utils;

pub use config::{ConfigError, FocusPolicy, Neighborhood, SimConfig};
mod config;

pub use world::{Cell, CellState, SparseWorld, StateCounts, World};
pub mod world;

pub mod engine;

pub use sim::{Sim, SimCmd, SimHandle};
mod sim;

pub use view::View;
mod view;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Focus {
    Center,
    Random,
    Brush,
}

/// Interactive epidemic cellular automaton on an unbounded grid.
///
/// Keys: arrows pan, space pauses, `r` reseeds, left mouse paints,
/// `x` flips the brush, `[`/`]` and `{`/`}` tune the infection and death
/// chances, `,`/`.` tune the duration, `-`/`+` slow down and speed up the
/// simulation, `n` toggles the neighborhood, `q` quits.
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Per-neighbor transmission probability, in [0, 1].
    #[arg(long, default_value_t = 0.3)]
    infection_chance: f64,

    /// Ticks an infection lasts before it resolves.
    #[arg(long, default_value_t = 10)]
    infection_duration: u32,

    /// Probability an expired infection resolves to death, in [0, 1].
    #[arg(long, default_value_t = 0.5)]
    death_chance: f64,

    /// Adjacency used for infection spread.
    #[arg(long, value_enum, default_value = "moore")]
    neighborhood: Neighborhood,

    /// How the world is seeded on start and on reset.
    #[arg(long, value_enum, default_value = "center")]
    focus: Focus,

    /// Half-width of the square around the origin used by random seeding.
    #[arg(long, default_value_t = 35, value_parser = clap::value_parser!(i64).range(1..))]
    seed_extent: i64,

    /// Milliseconds between generation steps.
    #[arg(long, default_value_t = 200, value_parser = clap::value_parser!(u64).range(20..=2000))]
    tick_ms: u64,

    /// Seed for the random stream; a fresh one is drawn when omitted.
    #[arg(long)]
    seed: Option<u64>,
}

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = SimConfig {
        infection_chance: args.infection_chance,
        infection_duration: args.infection_duration,
        death_chance: args.death_chance,
        neighborhood: args.neighborhood,
    }
    .validated()?;

    let focus = match args.focus {
        Focus::Center => FocusPolicy::Center,
        Focus::Random => FocusPolicy::Random {
            half_width: args.seed_extent,
        },
        Focus::Brush => FocusPolicy::Brush,
    };

    let tick_interval = Duration::from_millis(args.tick_ms);
    let simulation = Sim::<SparseWorld>::spawn(config, focus, args.seed, tick_interval);
    let view = View::spawn(simulation.handle(), config, focus, tick_interval);

    simulation.join();
    view.join();
    Ok(())
}
