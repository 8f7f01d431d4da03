//! Outcome generation and payout curves.
//!
//! Pure functions: every game outcome is drawn here, once, at session start,
//! from a random source supplied by the caller. Progress calls later consume
//! prefixes of the pre-generated data and never come back to this module.
//! Nothing in here does I/O or holds state.

use rand::seq::index::sample;
use rand::Rng;

/// Cells on the mines grid.
pub const GRID_CELLS: usize = 25;

/// Slots per tier in the towers game.
pub const TIER_SLOTS: usize = 3;

/// Tier count bounds for the towers game.
pub const MIN_TIERS: usize = 3;
pub const MAX_TIERS: usize = 8;

/// Probability of an instant bust (crash point pinned to 1.00).
const CRASH_FLOOR_PROBABILITY: f64 = 0.05;

/// House-edge numerator of the crash curve: expected return per unit
/// stake at any fixed cashout target is exactly this value.
const CRASH_EDGE_NUMERATOR: f64 = 0.99;

/// Hard cap on the crash multiplier, bounding single-round payout risk.
const CRASH_POINT_CAP: f64 = 1000.0;

/// Per-reveal house-edge discount on the mines fair-odds multiplier.
const GRID_STEP_DISCOUNT: f64 = 0.97;

/// Base and ratio of the towers multiplier ladder.
const TIER_LADDER_BASE: f64 = 1.5;
const TIER_LADDER_RATIO: f64 = 1.4;

/// Round to 2 decimal places. Applied at the point of computation so that
/// the value persisted in a session is exactly the value credited.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Draw a crash point.
///
/// With probability 0.05 the round busts instantly at 1.00. Otherwise the
/// point follows the heavy-tailed curve `0.99 / (1 - r)`, capped at 1000x.
pub fn crash_point<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let r: f64 = rng.gen();
    if r < CRASH_FLOOR_PROBABILITY {
        return 1.0;
    }
    round2((CRASH_EDGE_NUMERATOR / (1.0 - r)).min(CRASH_POINT_CAP))
}

/// Lay out `mines` mines on a board of `cells` cells, uniformly over all
/// C(cells, mines) combinations. `true` marks a mine.
pub fn mine_board<R: Rng + ?Sized>(rng: &mut R, cells: usize, mines: usize) -> Vec<bool> {
    debug_assert!(mines >= 1 && mines < cells);
    let mut board = vec![false; cells];
    for idx in sample(rng, cells, mines) {
        board[idx] = true;
    }
    board
}

/// Multiplier after `revealed` consecutive safe reveals on a board of
/// `cells` cells holding `mines` mines.
///
/// Compounds the inverse survival probability of each successive draw,
/// discounted 3% per step, and rounds once at the end.
pub fn grid_multiplier(revealed: usize, mines: usize, cells: usize) -> f64 {
    if revealed == 0 {
        return 1.0;
    }
    let safe = cells - mines;
    let mut m = 1.0;
    for i in 0..revealed {
        let safe_probability = (safe - i) as f64 / (cells - i) as f64;
        m *= GRID_STEP_DISCOUNT / safe_probability;
    }
    round2(m)
}

/// Fixed geometric multiplier ladder for a towers board of `levels` tiers.
/// Only the board layout is random; the ladder never is.
pub fn tier_ladder(levels: usize) -> Vec<f64> {
    (0..levels)
        .map(|i| round2(TIER_LADDER_BASE * TIER_LADDER_RATIO.powi(i as i32)))
        .collect()
}

/// Pre-generate the boards for every tier of a towers round: each tier has
/// [`TIER_SLOTS`] slots with exactly one bad slot placed uniformly,
/// independently per tier. `true` marks the bad slot.
pub fn tier_boards<R: Rng + ?Sized>(rng: &mut R, levels: usize) -> Vec<Vec<bool>> {
    (0..levels)
        .map(|_| {
            let bad = rng.gen_range(0..TIER_SLOTS);
            (0..TIER_SLOTS).map(|s| s == bad).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.485632), 1.49);
        assert_eq!(round2(4.116), 4.12);
        assert_eq!(round2(10_000.0 * 1.84), 18_400.0);
    }

    #[test]
    fn test_crash_floor_frequency_band() {
        let mut rng = StdRng::seed_from_u64(7);
        let samples = 100_000;
        let floor_hits = (0..samples)
            .filter(|_| crash_point(&mut rng) == 1.0)
            .count();
        // 5% instant-bust floor, with a tolerance band for sampling noise.
        assert!(floor_hits >= 4_500, "floor hits too low: {}", floor_hits);
        assert!(floor_hits <= 5_500, "floor hits too high: {}", floor_hits);
    }

    #[test]
    fn test_crash_point_never_exceeds_cap() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100_000 {
            let p = crash_point(&mut rng);
            assert!(p >= 1.0);
            assert!(p <= 1000.0);
        }
    }

    #[test]
    fn test_crash_house_edge_present() {
        // Expected return per unit stake at a fixed cashout target is the
        // 0.99 numerator; the empirical mean must stay below break-even.
        let mut rng = StdRng::seed_from_u64(13);
        let samples: Vec<f64> = (0..100_000).map(|_| crash_point(&mut rng)).collect();
        for target in [1.5, 2.0, 3.0] {
            let paid: f64 = samples
                .iter()
                .map(|&p| if target <= p { target } else { 0.0 })
                .sum();
            let mean_return = paid / samples.len() as f64;
            assert!(
                mean_return < 1.0,
                "no house edge at target {}: {}",
                target,
                mean_return
            );
            assert!(mean_return > 0.9, "edge implausibly large: {}", mean_return);
        }
    }

    #[test]
    fn test_mine_board_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        for mines in [1, 5, 24] {
            let board = mine_board(&mut rng, GRID_CELLS, mines);
            assert_eq!(board.len(), GRID_CELLS);
            assert_eq!(board.iter().filter(|&&m| m).count(), mines);
        }
    }

    #[test]
    fn test_grid_multiplier_base_and_growth() {
        assert_eq!(grid_multiplier(0, 5, GRID_CELLS), 1.0);
        let mut prev = 1.0;
        for revealed in 1..=20 {
            let m = grid_multiplier(revealed, 5, GRID_CELLS);
            assert!(m > prev, "multiplier not increasing at depth {}", revealed);
            prev = m;
        }
    }

    #[test]
    fn test_grid_multiplier_exact_values() {
        // k=5 on 25 cells: 0.97 * 25/20, then * 0.97 * 24/19, then * 0.97 * 23/18.
        assert_eq!(grid_multiplier(1, 5, GRID_CELLS), 1.21);
        assert_eq!(grid_multiplier(2, 5, GRID_CELLS), 1.49);
        assert_eq!(grid_multiplier(3, 5, GRID_CELLS), 1.84);
    }

    #[test]
    fn test_tier_ladder_exact_values() {
        assert_eq!(tier_ladder(5), vec![1.50, 2.10, 2.94, 4.12, 5.76]);
    }

    #[test]
    fn test_tier_boards_one_bad_slot_each() {
        let mut rng = StdRng::seed_from_u64(17);
        let boards = tier_boards(&mut rng, 8);
        assert_eq!(boards.len(), 8);
        for board in &boards {
            assert_eq!(board.len(), TIER_SLOTS);
            assert_eq!(board.iter().filter(|&&b| b).count(), 1);
        }
    }
}
