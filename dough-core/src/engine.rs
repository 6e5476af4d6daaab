//! Recipe derivation: total dough → flour/water/salt split, poolish size
//! and additives, plus what is left to add at the final mix.

use log::debug;
use serde::Serialize;

use crate::inputs::{RecipeInputs, YeastType};
use crate::lock::PoolishLock;
use crate::schedule::{Schedule, schedule_for};

/// Allowed poolish sizes (g flour, same amount of water), largest first.
pub const POOLISH_CANDIDATES: [i64; 3] = [300, 200, 100];
/// Instant dry yeast as a fraction of poolish flour.
pub const IDY_PCT: f64 = 0.015;
/// Honey as a fraction of poolish flour.
pub const HONEY_PCT: f64 = 0.015;
/// Above this many portions the batch gets hard to handle in one bowl.
pub const LARGE_BATCH_PORTIONS: i64 = 12;

/// Everything the calculator shows, recomputed on every input change.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct DerivedRecipe {
    pub total_dough_g: i64,
    /// Total flour in the recipe, poolish included.
    pub flour_g: f64,
    pub water_g: f64,
    pub salt_g: f64,
    pub yeast: YeastType,
    pub poolish_flour_g: i64,
    pub poolish_water_g: i64,
    pub poolish_yeast_g: f64,
    pub poolish_honey_g: f64,
    /// Left to add at the final mix.
    pub remaining_flour_g: i64,
    pub remaining_water_g: i64,
    pub remaining_salt_g: i64,
    /// The poolish size came from a lock, not from the candidate search.
    pub locked: bool,
    /// A locked poolish no longer fits inside the recipe totals.
    pub poolish_too_big: bool,
    pub large_batch: bool,
    pub schedule: Schedule,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct Split {
    flour: f64,
    water: f64,
    salt: f64,
}

/// Solve `flour * (1 + h + s) = total`.
fn split(total: f64, h: f64, s: f64) -> Split {
    let flour = total / (1.0 + h + s);
    Split {
        flour,
        water: h * flour,
        salt: s * flour,
    }
}

/// (honey, yeast) grams carried into the dough by a poolish.
fn additives(poolish_flour: i64, yeast: YeastType) -> (f64, f64) {
    let pf = poolish_flour as f64;
    (pf * HONEY_PCT, pf * IDY_PCT * yeast.factor())
}

/// Split the total after taking out the poolish additives. Additives larger
/// than the whole dough leave nothing to split.
fn split_after_additives(
    total: f64,
    h: f64,
    s: f64,
    poolish_flour: i64,
    yeast: YeastType,
) -> Split {
    let (honey, yeast_g) = additives(poolish_flour, yeast);
    split((total - (honey + yeast_g)).max(0.0), h, s)
}

/// Largest candidate that fits in both the flour and the water, or 0.
pub fn choose_poolish_candidate(flour_g: f64, water_g: f64) -> i64 {
    POOLISH_CANDIDATES
        .into_iter()
        .find(|&c| c as f64 <= flour_g && c as f64 <= water_g)
        .unwrap_or(0)
}

/// Half rounds up, like a kitchen scale display.
#[inline]
fn round_g(x: f64) -> i64 {
    (x + 0.5).floor() as i64
}

/// Non-finite or negative percentages read as 0.
#[inline]
fn fraction(pct: f64) -> f64 {
    if pct.is_finite() { pct.max(0.0) / 100.0 } else { 0.0 }
}

/// Derive the full recipe. `lock` pins the poolish size; without it the
/// size is picked from [`POOLISH_CANDIDATES`] with a single correction pass
/// after the additives are taken out. The correction is deliberately not
/// repeated until it settles.
pub fn derive(inputs: &RecipeInputs, lock: Option<&PoolishLock>) -> DerivedRecipe {
    let total_dough_g = inputs
        .portions
        .saturating_mul(inputs.portion_size_g)
        .max(0);
    let total = total_dough_g as f64;
    let h = fraction(inputs.hydration_pct);
    let s = fraction(inputs.salt_pct);
    let yeast = inputs.yeast;

    let (poolish_flour_g, poolish_water_g, dough) = match lock {
        Some(lock) => (
            lock.flour_g,
            lock.water_g,
            split_after_additives(total, h, s, lock.flour_g, yeast),
        ),
        None => {
            let estimate = split(total, h, s);
            let first = choose_poolish_candidate(estimate.flour, estimate.water);
            let mut dough = split_after_additives(total, h, s, first, yeast);
            let corrected = choose_poolish_candidate(dough.flour, dough.water);
            debug!(
                "poolish candidate {first} g from {:.1} g flour / {:.1} g water, \
                 rechecked {corrected} g",
                estimate.flour, estimate.water
            );
            if corrected != first {
                dough = split_after_additives(total, h, s, corrected, yeast);
            }
            (corrected, corrected, dough)
        }
    };

    let (poolish_honey_g, poolish_yeast_g) = additives(poolish_flour_g, yeast);
    let poolish_too_big = lock.is_some()
        && (poolish_flour_g as f64 > dough.flour || poolish_water_g as f64 > dough.water);
    if poolish_too_big {
        debug!(
            "locked poolish {poolish_flour_g}/{poolish_water_g} g exceeds {:.1}/{:.1} g",
            dough.flour, dough.water
        );
    }

    DerivedRecipe {
        total_dough_g,
        flour_g: dough.flour,
        water_g: dough.water,
        salt_g: dough.salt,
        yeast,
        poolish_flour_g,
        poolish_water_g,
        poolish_yeast_g,
        poolish_honey_g,
        remaining_flour_g: round_g(dough.flour - poolish_flour_g as f64).max(0),
        remaining_water_g: round_g(dough.water - poolish_water_g as f64).max(0),
        remaining_salt_g: round_g(dough.salt),
        locked: lock.is_some(),
        poolish_too_big,
        large_batch: inputs.portions > LARGE_BATCH_PORTIONS,
        schedule: schedule_for(inputs.eat_at),
    }
}

impl DerivedRecipe {
    /// Grams shown for a fractional amount.
    pub fn display_g(x: f64) -> i64 {
        round_g(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDateTime;
    use proptest::prelude::*;

    fn inputs(
        portions: i64,
        size: i64,
        hydration: f64,
        salt: f64,
        yeast: YeastType,
    ) -> RecipeInputs {
        RecipeInputs {
            portions,
            portion_size_g: size,
            hydration_pct: hydration,
            salt_pct: salt,
            yeast,
            eat_at: NaiveDateTime::parse_from_str("2025-01-05 18:00", "%Y-%m-%d %H:%M").unwrap(),
        }
    }

    fn standard() -> RecipeInputs {
        inputs(2, 280, 70.0, 3.0, YeastType::InstantDry)
    }

    #[test]
    fn test_two_portions_pick_200g_poolish() {
        let r = derive(&standard(), None);
        assert_eq!(r.total_dough_g, 560);
        // 300 g would not fit the ~226 g of water.
        assert_eq!(r.poolish_flour_g, 200);
        assert_eq!(r.poolish_water_g, 200);
        assert_relative_eq!(r.poolish_yeast_g, 3.0, epsilon = 1e-9);
        assert_relative_eq!(r.poolish_honey_g, 3.0, epsilon = 1e-9);
        assert_relative_eq!(r.flour_g, 554.0 / 1.73, epsilon = 1e-9);
        assert_relative_eq!(r.water_g, 0.7 * 554.0 / 1.73, epsilon = 1e-9);
        assert_eq!(r.remaining_flour_g, 120);
        assert_eq!(r.remaining_water_g, 24);
        assert_eq!(r.remaining_salt_g, 10);
        assert!(!r.locked);
        assert!(!r.poolish_too_big);
        assert!(!r.large_batch);
    }

    #[test]
    fn test_mass_balance_holds() {
        let r = derive(&standard(), None);
        let sum = r.flour_g * 1.73 + r.poolish_honey_g + r.poolish_yeast_g;
        assert_relative_eq!(sum, 560.0, epsilon = 1e-9);
    }

    #[test]
    fn test_fresh_yeast_is_three_times_dry() {
        let dry = derive(&standard(), None);
        let fresh = derive(&inputs(2, 280, 70.0, 3.0, YeastType::Fresh), None);
        assert_eq!(fresh.poolish_flour_g, dry.poolish_flour_g);
        assert_relative_eq!(fresh.poolish_yeast_g, 3.0 * dry.poolish_yeast_g, epsilon = 1e-9);
        assert_relative_eq!(fresh.poolish_honey_g, dry.poolish_honey_g, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_and_negative_totals() {
        for (portions, size) in [(0, 280), (2, 0), (-3, 280), (2, -280)] {
            let r = derive(&inputs(portions, size, 70.0, 3.0, YeastType::InstantDry), None);
            assert_eq!(r.total_dough_g, 0);
            assert_eq!(r.poolish_flour_g, 0);
            assert_eq!(r.flour_g, 0.0);
            assert_eq!(r.poolish_yeast_g, 0.0);
            assert_eq!(r.remaining_flour_g, 0);
            assert_eq!(r.remaining_salt_g, 0);
        }
    }

    #[test]
    fn test_garbage_percentages_do_not_blow_up() {
        let r = derive(&inputs(2, 280, f64::NAN, -50.0, YeastType::InstantDry), None);
        assert_eq!(r.total_dough_g, 560);
        assert!(r.flour_g.is_finite());
        assert_eq!(r.salt_g, 0.0);
    }

    #[test]
    fn test_large_batch_flag() {
        assert!(derive(&inputs(20, 280, 70.0, 3.0, YeastType::InstantDry), None).large_batch);
        assert!(!derive(&inputs(12, 280, 70.0, 3.0, YeastType::InstantDry), None).large_batch);
    }

    #[test]
    fn test_correction_pass_downsizes_candidate() {
        // ~301 g water before additives, ~298 g after taking out 9 g.
        let r = derive(&inputs(1, 745, 70.0, 3.0, YeastType::InstantDry), None);
        assert_eq!(r.poolish_flour_g, 200);
        assert_relative_eq!(r.flour_g, 739.0 / 1.73, epsilon = 1e-9);
    }

    #[test]
    fn test_correction_pass_runs_once() {
        // After switching to 200 g the water climbs back over 300 g; a
        // second recheck would flip again, but only one pass is made.
        let r = derive(&inputs(1, 748, 70.0, 3.0, YeastType::InstantDry), None);
        assert_eq!(r.poolish_flour_g, 200);
        assert_eq!(choose_poolish_candidate(r.flour_g, r.water_g), 300);
    }

    #[test]
    fn test_candidate_selection() {
        assert_eq!(choose_poolish_candidate(400.0, 310.0), 300);
        assert_eq!(choose_poolish_candidate(400.0, 299.9), 200);
        assert_eq!(choose_poolish_candidate(150.0, 100.0), 100);
        assert_eq!(choose_poolish_candidate(99.0, 500.0), 0);
    }

    #[test]
    fn test_lock_overrides_candidates() {
        let lock = PoolishLock::new(100, 100);
        let r = derive(&standard(), Some(&lock));
        assert!(r.locked);
        assert_eq!(r.poolish_flour_g, 100);
        assert_relative_eq!(r.flour_g, (560.0 - 3.0) / 1.73, epsilon = 1e-9);
        assert!(!r.poolish_too_big);
    }

    #[test]
    fn test_locked_poolish_too_big_after_shrinking() {
        let lock = PoolishLock::new(200, 200);
        let r = derive(&inputs(1, 280, 70.0, 3.0, YeastType::InstantDry), Some(&lock));
        assert!(r.poolish_too_big);
        assert_eq!(r.remaining_water_g, 0);
        assert_eq!(r.remaining_flour_g, 0);
    }

    #[test]
    fn test_lock_additives_larger_than_dough_floor_at_zero() {
        let lock = PoolishLock::new(10_000, 10_000);
        let r = derive(&inputs(1, 1, 70.0, 3.0, YeastType::InstantDry), Some(&lock));
        assert!(r.poolish_too_big);
        assert_eq!(r.flour_g, 0.0);
        assert_eq!(r.water_g, 0.0);
        assert_eq!(r.salt_g, 0.0);
        assert_eq!(r.remaining_flour_g, 0);
        assert_eq!(r.remaining_water_g, 0);
        assert_eq!(r.remaining_salt_g, 0);
    }

    #[test]
    fn test_unlock_restores_automatic_choice() {
        let before = derive(&standard(), None);
        let locked = derive(&standard(), Some(&PoolishLock::new(300, 300)));
        assert_ne!(locked.poolish_flour_g, before.poolish_flour_g);
        assert_eq!(derive(&standard(), None), before);
    }

    proptest! {
        #[test]
        fn prop_mass_balance(
            portions in 1i64..40,
            size in 1i64..800,
            hydration in 50i64..=85,
            salt in 1.0f64..=4.0,
            fresh in any::<bool>(),
        ) {
            let yeast = if fresh { YeastType::Fresh } else { YeastType::InstantDry };
            let r = derive(&inputs(portions, size, hydration as f64, salt, yeast), None);
            let k = 1.0 + hydration as f64 / 100.0 + salt / 100.0;
            let sum = r.flour_g * k + r.poolish_honey_g + r.poolish_yeast_g;
            prop_assert!((sum - r.total_dough_g as f64).abs() < 1e-6);
        }

        #[test]
        fn prop_poolish_size_never_shrinks_with_bigger_batches(
            a in 1i64..4000,
            b in 1i64..4000,
            hydration in 50i64..=85,
            salt in 1.0f64..=4.0,
            fresh in any::<bool>(),
        ) {
            let yeast = if fresh { YeastType::Fresh } else { YeastType::InstantDry };
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let small = derive(&inputs(1, lo, hydration as f64, salt, yeast), None);
            let big = derive(&inputs(1, hi, hydration as f64, salt, yeast), None);
            prop_assert!(big.poolish_flour_g >= small.poolish_flour_g);
        }

        #[test]
        fn prop_too_big_iff_locked_and_exceeding(
            portions in 1i64..10,
            size in 50i64..400,
            flour in 0i64..400,
            water in 0i64..400,
        ) {
            let lock = PoolishLock::new(flour, water);
            let i = inputs(portions, size, 70.0, 3.0, YeastType::InstantDry);
            let r = derive(&i, Some(&lock));
            let expected = lock.flour_g as f64 > r.flour_g || lock.water_g as f64 > r.water_g;
            prop_assert_eq!(r.poolish_too_big, expected);
            prop_assert!(!derive(&i, None).poolish_too_big);
        }
    }
}
