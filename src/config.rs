use clap::ValueEnum;
use thiserror::Error;

use crate::{pos, Pos};

const MOORE_OFFSETS: [Pos; 8] = [
    pos!(-1, -1),
    pos!(0, -1),
    pos!(1, -1),
    pos!(-1, 0),
    pos!(1, 0),
    pos!(-1, 1),
    pos!(0, 1),
    pos!(1, 1),
];

const VON_NEUMANN_OFFSETS: [Pos; 4] = [pos!(0, -1), pos!(-1, 0), pos!(1, 0), pos!(0, 1)];

/// Adjacency topology used for infection spread. The plane is unbounded, so
/// every coordinate has a full neighbor set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Neighborhood {
    /// 8 cells at Chebyshev distance 1.
    #[default]
    Moore,
    /// 4 cells at Manhattan distance 1.
    VonNeumann,
}

impl Neighborhood {
    pub fn offsets(self) -> &'static [Pos] {
        match self {
            Self::Moore => &MOORE_OFFSETS,
            Self::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }

    pub fn neighbors(self, pos: Pos) -> impl Iterator<Item = Pos> {
        self.offsets().iter().map(move |&offset| pos + offset)
    }
}

/// Tunable simulation parameters, snapshotted per tick. The UI produces new
/// values between ticks; a running step never observes a change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Per-neighbor-pair base transmission probability, in [0, 1].
    pub infection_chance: f64,
    /// Ticks an infection lasts before it resolves.
    pub infection_duration: u32,
    /// Probability an expired infection resolves to death, in [0, 1].
    pub death_chance: f64,
    pub neighborhood: Neighborhood,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            infection_chance: 0.3,
            infection_duration: 10,
            death_chance: 0.5,
            neighborhood: Neighborhood::Moore,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be within [0, 1], got {value}")]
    ChanceOutOfRange { name: &'static str, value: f64 },
}

impl SimConfig {
    /// Checks the probability bounds once at the config boundary. Malformed
    /// values are rejected, not clamped; the stepping algorithm assumes a
    /// validated config.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let chances = [
            ("infection chance", self.infection_chance),
            ("death chance", self.death_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ChanceOutOfRange { name, value });
            }
        }
        Ok(self)
    }
}

/// How the world is seeded at reset time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPolicy {
    /// One infected cell at the origin.
    Center,
    /// A handful of infected cells scattered in the square
    /// [-half_width, half_width) around the origin. Extents below 1 are
    /// widened to 1 when seeding.
    Random { half_width: i64 },
    /// No automatic seeding; infections come from the brush.
    Brush,
}

#[test]
fn test_validated_accepts_bounds() {
    let config = SimConfig {
        infection_chance: 0.0,
        death_chance: 1.0,
        ..SimConfig::default()
    };
    assert!(config.validated().is_ok());
}

#[test]
fn test_validated_rejects_out_of_range_chance() {
    let config = SimConfig {
        infection_chance: 1.5,
        ..SimConfig::default()
    };
    assert!(config.validated().is_err());

    let config = SimConfig {
        death_chance: -0.1,
        ..SimConfig::default()
    };
    assert!(config.validated().is_err());
}

#[test]
fn test_neighborhood_sizes() {
    assert_eq!(Neighborhood::Moore.neighbors(pos!(3, -7)).count(), 8);
    assert_eq!(Neighborhood::VonNeumann.neighbors(pos!(3, -7)).count(), 4);
}
