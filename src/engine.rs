use std::collections::HashSet;

use metrohash::MetroBuildHasher;
use rand::Rng;

use crate::{pos, Cell, CellState, FocusPolicy, Pos, SimConfig, World};

/// Probability that a healthy cell with `infected` infected neighbors gets
/// infected this tick, treating each exposure as an independent trial at the
/// base rate: `1 - (1 - chance)^k`.
fn infection_probability(chance: f64, infected: u32) -> f64 {
    1.0 - (1.0 - chance).powi(infected as i32)
}

fn infected_neighbors<W: World>(world: &W, pos: Pos, config: &SimConfig) -> u32 {
    config
        .neighborhood
        .neighbors(pos)
        .filter(|&neighbor| world.get(neighbor).state == CellState::Infected)
        .count() as u32
}

/// Computes generation N+1 from generation N. Reads only from `world` and
/// writes only into a fresh one, so no cell observes a mid-pass update.
///
/// Only the stored cells and their neighbors can change this tick; a healthy
/// cell further away has no infected neighbor by construction. Candidates
/// are visited in coordinate order so a seeded run is reproducible.
pub fn step<W: World>(world: &W, config: &SimConfig, rng: &mut impl Rng) -> W {
    let mut candidates: HashSet<Pos, MetroBuildHasher> = HashSet::default();
    for pos in world.actives() {
        candidates.insert(pos);
        candidates.extend(config.neighborhood.neighbors(pos));
    }
    let mut candidates = candidates.into_iter().collect::<Vec<_>>();
    candidates.sort_unstable();

    let mut next = W::default();
    for pos in candidates {
        let cell = world.get(pos);
        let new_cell = match cell.state {
            CellState::Healthy => {
                let infected = infected_neighbors(world, pos, config);
                // one draw per exposed cell, none when no neighbor is infected
                if infected > 0
                    && rng.gen::<f64>() < infection_probability(config.infection_chance, infected)
                {
                    Cell::infected(config.infection_duration)
                } else {
                    Cell::healthy()
                }
            }
            CellState::Infected => {
                let timer = cell.timer.saturating_sub(1);
                if timer == 0 {
                    if rng.gen::<f64>() < config.death_chance {
                        Cell::dead()
                    } else {
                        Cell::recovered()
                    }
                } else {
                    Cell::infected(timer)
                }
            }
            // terminal, carried over as-is
            CellState::Dead | CellState::Recovered => cell,
        };
        // healthy results are dropped, keeping the store sparse
        if new_cell.state != CellState::Healthy {
            next.set(pos, new_cell);
        }
    }
    next
}

/// Seeds a fresh world according to the focus policy. Random seeding may
/// land cells on the same coordinate; the later draw simply overwrites.
pub fn seed<W: World>(config: &SimConfig, focus: FocusPolicy, rng: &mut impl Rng) -> W {
    let mut world = W::default();
    match focus {
        FocusPolicy::Center => {
            world.set(pos!(0, 0), Cell::infected(config.infection_duration));
        }
        FocusPolicy::Random { half_width } => {
            // an extent below 1 would make the sample range empty
            let half_width = half_width.max(1);
            let count: u32 = rng.gen_range(5..15);
            for _ in 0..count {
                let x = rng.gen_range(-half_width..half_width);
                let y = rng.gen_range(-half_width..half_width);
                world.set(pos!(x, y), Cell::infected(config.infection_duration));
            }
        }
        FocusPolicy::Brush => {}
    }
    world
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::{pos, Neighborhood, SparseWorld};

    fn rng(seed: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(seed)
    }

    fn config(chance: f64, duration: u32, death: f64, neighborhood: Neighborhood) -> SimConfig {
        SimConfig {
            infection_chance: chance,
            infection_duration: duration,
            death_chance: death,
            neighborhood,
        }
    }

    #[test]
    fn center_seed_spreads_to_all_moore_neighbors() {
        let config = config(1.0, 3, 0.5, Neighborhood::Moore);
        let mut rng = rng(1);
        let world: SparseWorld = seed(&config, FocusPolicy::Center, &mut rng);

        let world = step(&world, &config, &mut rng);
        assert_eq!(world.len(), 9);
        assert_eq!(world.get(pos!(0, 0)), Cell::infected(2));
        for neighbor in Neighborhood::Moore.neighbors(pos!(0, 0)) {
            assert_eq!(world.get(neighbor), Cell::infected(3));
        }
    }

    #[test]
    fn von_neumann_spreads_to_four_neighbors() {
        let config = config(1.0, 5, 0.5, Neighborhood::VonNeumann);
        let mut rng = rng(2);
        let world: SparseWorld = seed(&config, FocusPolicy::Center, &mut rng);

        let world = step(&world, &config, &mut rng);
        assert_eq!(world.len(), 5);
        assert_eq!(world.get(pos!(1, 1)), Cell::healthy());
        assert_eq!(world.get(pos!(0, 1)), Cell::infected(5));
    }

    #[test]
    fn no_infected_neighbor_never_infects() {
        // a dead cell makes its healthy neighbors candidates, but with zero
        // infected neighbors their infection probability is exactly 0
        let config = config(1.0, 10, 0.5, Neighborhood::Moore);
        let mut world = SparseWorld::default();
        world.set(pos!(0, 0), Cell::dead());

        let world = step(&world, &config, &mut rng(3));
        assert_eq!(world.len(), 1);
        assert_eq!(world.get(pos!(0, 0)), Cell::dead());
    }

    #[test]
    fn timer_decrements_while_infection_lasts() {
        let config = config(0.0, 10, 0.5, Neighborhood::Moore);
        let mut rng = rng(4);
        let mut world = SparseWorld::default();
        world.set(pos!(0, 0), Cell::infected(5));

        world = step(&world, &config, &mut rng);
        assert_eq!(world.get(pos!(0, 0)), Cell::infected(4));
        world = step(&world, &config, &mut rng);
        assert_eq!(world.get(pos!(0, 0)), Cell::infected(3));
    }

    #[test]
    fn expiry_resolves_to_recovered_and_stays() {
        let config = config(0.0, 10, 0.0, Neighborhood::Moore);
        let mut rng = rng(5);
        let mut world = SparseWorld::default();
        world.set(pos!(0, 0), Cell::infected(1));

        world = step(&world, &config, &mut rng);
        assert_eq!(world.get(pos!(0, 0)), Cell::recovered());

        for _ in 0..10 {
            world = step(&world, &config, &mut rng);
            assert_eq!(world.get(pos!(0, 0)), Cell::recovered());
        }
        assert_eq!(world.counts().recovered, 1);
    }

    #[test]
    fn expiry_resolves_to_dead_when_death_is_certain() {
        let config = config(0.0, 10, 1.0, Neighborhood::Moore);
        let mut world = SparseWorld::default();
        world.set(pos!(0, 0), Cell::infected(1));

        let world = step(&world, &config, &mut rng(6));
        assert_eq!(world.get(pos!(0, 0)), Cell::dead());
    }

    #[test]
    fn terminal_states_survive_steps_unchanged() {
        let config = config(1.0, 10, 1.0, Neighborhood::Moore);
        let mut world = SparseWorld::default();
        world.set(pos!(3, 3), Cell::dead());
        world.set(pos!(-3, -3), Cell::recovered());

        let world = step(&world, &config, &mut rng(7));
        assert_eq!(world.get(pos!(3, 3)), Cell::dead());
        assert_eq!(world.get(pos!(-3, -3)), Cell::recovered());
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn stored_cells_are_never_healthy() {
        let config = config(0.7, 2, 0.5, Neighborhood::Moore);
        let mut rng = rng(8);
        let mut world: SparseWorld =
            seed(&config, FocusPolicy::Random { half_width: 10 }, &mut rng);

        for _ in 0..10 {
            world = step(&world, &config, &mut rng);
            for pos in world.actives() {
                assert_ne!(world.get(pos).state, CellState::Healthy);
            }
        }
    }

    #[test]
    fn same_seed_yields_identical_generations() {
        let config = config(0.4, 6, 0.3, Neighborhood::Moore);
        let mut world = SparseWorld::default();
        world.set(pos!(0, 0), Cell::infected(6));
        world.set(pos!(4, -2), Cell::infected(3));

        let mut left = world.clone();
        let mut right = world;
        let mut rng_left = rng(9);
        let mut rng_right = rng(9);
        for _ in 0..20 {
            left = step(&left, &config, &mut rng_left);
            right = step(&right, &config, &mut rng_right);
            assert_eq!(left, right);
        }
    }

    #[test]
    fn infection_rate_matches_union_bound() {
        const TRIALS: u32 = 4000;
        let chance = 0.3;
        let config = config(chance, 10, 0.5, Neighborhood::Moore);
        let mut rng = rng(10);

        for k in [1u32, 2, 3, 8] {
            let mut template = SparseWorld::default();
            for &offset in &Neighborhood::Moore.offsets()[..k as usize] {
                template.set(pos!(0, 0) + offset, Cell::infected(10));
            }

            let mut infections = 0;
            for _ in 0..TRIALS {
                let next = step(&template, &config, &mut rng);
                if next.get(pos!(0, 0)).state == CellState::Infected {
                    infections += 1;
                }
            }
            let empirical = f64::from(infections) / f64::from(TRIALS);
            let expected = infection_probability(chance, k);
            assert!(
                (empirical - expected).abs() < 0.05,
                "k={k}: empirical {empirical} vs expected {expected}"
            );
        }
    }

    #[test]
    fn seed_center_infects_origin_only() {
        let config = config(0.3, 7, 0.5, Neighborhood::Moore);
        let world: SparseWorld = seed(&config, FocusPolicy::Center, &mut rng(11));
        assert_eq!(world.actives(), vec![pos!(0, 0)]);
        assert_eq!(world.get(pos!(0, 0)), Cell::infected(7));
    }

    #[test]
    fn seed_random_stays_within_extent() {
        let config = SimConfig::default();
        let world: SparseWorld =
            seed(&config, FocusPolicy::Random { half_width: 20 }, &mut rng(12));

        // 5 to 14 draws, possibly fewer distinct cells
        let actives = world.actives();
        assert!(!actives.is_empty() && actives.len() < 15);
        for pos in actives {
            assert!((-20..20).contains(&pos.x) && (-20..20).contains(&pos.y));
            assert_eq!(world.get(pos), Cell::infected(config.infection_duration));
        }
    }

    #[test]
    fn seed_random_tolerates_degenerate_extent() {
        let config = SimConfig::default();
        let world: SparseWorld = seed(&config, FocusPolicy::Random { half_width: 0 }, &mut rng(14));

        assert!(!world.is_empty());
        for pos in world.actives() {
            assert!((-1..1).contains(&pos.x) && (-1..1).contains(&pos.y));
        }
    }

    #[test]
    fn seed_brush_starts_empty() {
        let config = SimConfig::default();
        let world: SparseWorld = seed(&config, FocusPolicy::Brush, &mut rng(13));
        assert!(world.is_empty());
    }
}
