//! The step-by-step wizard: per-step validation and the navigation rules.
//!
//! Steps are 1-based. Step 1 is the plan (inputs), 2 the poolish, 3 the
//! final mix and 4 the closing checklist. A step can only be entered
//! directly once every step before it validates.

use std::collections::BTreeSet;

use crate::engine::DerivedRecipe;
use crate::error::{DoughError, Result};
use crate::inputs::{Checkbox, FormValues, POOLISH_CHECKS, parse_number};

pub const TOTAL_STEPS: usize = 4;

const FRAGMENT_PREFIX: &str = "#step-";

/// What validation looks at.
#[derive(Copy, Clone, Debug)]
pub struct StepContext<'a> {
    pub form: &'a FormValues,
    pub checked: &'a BTreeSet<Checkbox>,
    pub derived: &'a DerivedRecipe,
    /// Number of checkboxes on the last page.
    pub finish_steps: u8,
}

/// Problems found on one step; empty means the step passes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Validation {
    pub messages: Vec<String>,
    /// Step 2 failed because the locked poolish no longer fits.
    pub poolish_too_big: bool,
}

impl Validation {
    pub fn is_ok(&self) -> bool {
        self.messages.is_empty()
    }

    fn fail(&mut self, message: &str) {
        self.messages.push(message.to_string());
    }
}

fn validate_plan(form: &FormValues, v: &mut Validation) {
    let num = |raw: &str| parse_number(raw).unwrap_or(f64::NAN);

    if form.eat_date.trim().is_empty() {
        v.fail("Please select a date.");
    }
    if form.eat_time.trim().is_empty() {
        v.fail("Please select a time.");
    }
    // NaN fails every comparison, so empty fields land here too.
    if !(num(&form.portions) >= 1.0) {
        v.fail("Portions must be at least 1.");
    }
    if !(num(&form.portion_size) > 0.0) {
        v.fail("Portion size must be greater than 0.");
    }
    if !(50.0..=85.0).contains(&num(&form.hydration)) {
        v.fail("Hydration should be between 50% and 85%.");
    }
    if !(1.0..=4.0).contains(&num(&form.salt)) {
        v.fail("Salt should be between 1% and 4%.");
    }
}

/// Check one step. Steps outside the wizard always pass.
pub fn validate_step(step: usize, ctx: &StepContext<'_>) -> Validation {
    let mut v = Validation::default();
    match step {
        1 => validate_plan(ctx.form, &mut v),
        2 => {
            if !POOLISH_CHECKS.iter().all(|c| ctx.checked.contains(c)) {
                v.fail("Please complete the poolish steps before continuing.");
            }
            if ctx.derived.poolish_too_big {
                v.poolish_too_big = true;
                v.fail("The locked poolish is larger than the recipe now allows.");
            }
        }
        3 => {
            if !ctx.checked.contains(&Checkbox::FinalMix) {
                v.fail("Please confirm the final mix step before continuing.");
            }
        }
        4 => {
            let all = ctx.finish_steps > 0
                && (1..=ctx.finish_steps).all(|n| ctx.checked.contains(&Checkbox::Finish(n)));
            if !all {
                v.fail("Please complete the final steps before finishing.");
            }
        }
        _ => {}
    }
    v
}

/// First step that does not validate, else the last step.
pub fn max_reachable_step(ctx: &StepContext<'_>, total: usize) -> usize {
    (1..total)
        .find(|&s| !validate_step(s, ctx).is_ok())
        .unwrap_or(total)
}

/// Route fragment for a step, e.g. `#step-2`.
pub fn fragment(step: usize) -> String {
    format!("{FRAGMENT_PREFIX}{step}")
}

/// Accepts `#step-N`, `step-N` or a bare `N`. Anything after the leading
/// digits is ignored, so `#step-2abc` is step 2.
pub fn parse_fragment(route: &str) -> Result<usize> {
    let trimmed = route.trim();
    let rest = trimmed
        .strip_prefix(FRAGMENT_PREFIX)
        .or_else(|| trimmed.strip_prefix(&FRAGMENT_PREFIX[1..]))
        .unwrap_or(trimmed);
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end]
        .parse::<usize>()
        .map_err(|_| DoughError::InvalidRoute(route.to_string()))
}

/// Where to start: the route, else the stored step, else 1; never past the
/// first invalid step.
pub fn initial_step(
    route: Option<&str>,
    stored: Option<&str>,
    max_reachable: usize,
    total: usize,
) -> usize {
    let requested = route
        .and_then(|r| parse_fragment(r).ok())
        .or_else(|| stored.and_then(|s| s.trim().parse::<usize>().ok()))
        .unwrap_or(1);
    requested.clamp(1, total).min(max_reachable.max(1))
}

/// Result of asking the wizard to move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Go to this step.
    Move(usize),
    /// The current step does not validate.
    Blocked(Validation),
    /// Last step completed; start over.
    Finish,
    /// Nothing to do.
    Stay,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Wizard {
    current: usize,
    total: usize,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(TOTAL_STEPS)
    }
}

impl Wizard {
    pub fn new(total: usize) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    /// Show `step`, clamped into range. Returns the step actually shown.
    pub fn set(&mut self, step: usize) -> usize {
        self.current = step.clamp(1, self.total);
        self.current
    }

    pub fn next(&self, ctx: &StepContext<'_>) -> Transition {
        let validation = validate_step(self.current, ctx);
        if !validation.is_ok() {
            Transition::Blocked(validation)
        } else if self.is_last() {
            Transition::Finish
        } else {
            Transition::Move(self.current + 1)
        }
    }

    pub fn prev(&self) -> Transition {
        if self.current > 1 {
            Transition::Move(self.current - 1)
        } else {
            Transition::Stay
        }
    }

    /// Direct jump, allowed up to the first invalid step.
    pub fn jump(&self, target: usize, ctx: &StepContext<'_>) -> Transition {
        if (1..=max_reachable_step(ctx, self.total)).contains(&target) {
            Transition::Move(target)
        } else {
            Transition::Stay
        }
    }

    /// Whether "Next" should be enabled; no side effects.
    pub fn can_advance(&self, ctx: &StepContext<'_>) -> bool {
        validate_step(self.current, ctx).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::derive;
    use crate::inputs::{DEFAULT_FINISH_STEPS, RecipeInputs};
    use crate::lock::PoolishLock;
    use chrono::NaiveDateTime;

    fn now() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2025-01-05 10:00", "%Y-%m-%d %H:%M").unwrap()
    }

    fn planned_form() -> FormValues {
        FormValues {
            eat_date: "2025-01-06".to_string(),
            eat_time: "19:00".to_string(),
            ..FormValues::default()
        }
    }

    fn all_boxes() -> BTreeSet<Checkbox> {
        Checkbox::all(DEFAULT_FINISH_STEPS).into_iter().collect()
    }

    fn ctx<'a>(
        form: &'a FormValues,
        checked: &'a BTreeSet<Checkbox>,
        derived: &'a DerivedRecipe,
    ) -> StepContext<'a> {
        StepContext {
            form,
            checked,
            derived,
            finish_steps: DEFAULT_FINISH_STEPS,
        }
    }

    #[test]
    fn test_plan_messages() {
        let form = FormValues {
            portions: "0".to_string(),
            portion_size: String::new(),
            hydration: "90".to_string(),
            salt: "0.5".to_string(),
            ..FormValues::default()
        };
        let derived = derive(&RecipeInputs::from_form(&form, now()), None);
        let checked = BTreeSet::new();
        let v = validate_step(1, &ctx(&form, &checked, &derived));
        assert_eq!(
            v.messages,
            vec![
                "Please select a date.",
                "Please select a time.",
                "Portions must be at least 1.",
                "Portion size must be greater than 0.",
                "Hydration should be between 50% and 85%.",
                "Salt should be between 1% and 4%.",
            ]
        );
    }

    fn plan_passes(portions: &str, size: &str, hydration: &str, salt: &str) -> bool {
        let form = FormValues {
            portions: portions.to_string(),
            portion_size: size.to_string(),
            hydration: hydration.to_string(),
            salt: salt.to_string(),
            ..planned_form()
        };
        let derived = derive(&RecipeInputs::from_form(&form, now()), None);
        let checked = BTreeSet::new();
        validate_step(1, &ctx(&form, &checked, &derived)).is_ok()
    }

    #[test]
    fn test_plan_ranges_are_inclusive() {
        assert!(plan_passes("1", "0.1", "50", "1"));
        assert!(plan_passes("1", "280", "85", "4"));
        assert!(plan_passes("2", "280", "70", "3"));

        assert!(!plan_passes("0", "280", "70", "3"));
        assert!(!plan_passes("2", "0", "70", "3"));
        assert!(!plan_passes("2", "280", "49", "3"));
        assert!(!plan_passes("2", "280", "86", "3"));
        assert!(!plan_passes("2", "280", "70", "0.99"));
        assert!(!plan_passes("2", "280", "70", "4.01"));
    }

    #[test]
    fn test_zero_portions_blocks_everything_after_plan() {
        let mut form = planned_form();
        form.portions = "0".to_string();
        let derived = derive(&RecipeInputs::from_form(&form, now()), None);
        let checked = all_boxes();
        let c = ctx(&form, &checked, &derived);
        assert_eq!(
            validate_step(1, &c).messages,
            vec!["Portions must be at least 1."]
        );
        assert_eq!(max_reachable_step(&c, TOTAL_STEPS), 1);
    }

    #[test]
    fn test_max_reachable_follows_checkboxes() {
        let form = planned_form();
        let derived = derive(&RecipeInputs::from_form(&form, now()), None);
        let mut checked = BTreeSet::new();
        assert_eq!(max_reachable_step(&ctx(&form, &checked, &derived), 4), 2);

        checked.extend(POOLISH_CHECKS);
        assert_eq!(max_reachable_step(&ctx(&form, &checked, &derived), 4), 3);

        checked.insert(Checkbox::FinalMix);
        assert_eq!(max_reachable_step(&ctx(&form, &checked, &derived), 4), 4);
    }

    #[test]
    fn test_poolish_too_big_fails_step_two() {
        let form = planned_form();
        let derived = derive(
            &RecipeInputs::from_form(&form, now()),
            Some(&PoolishLock::new(300, 300)),
        );
        let checked = all_boxes();
        let v = validate_step(2, &ctx(&form, &checked, &derived));
        assert!(v.poolish_too_big);
        assert_eq!(v.messages.len(), 1);
    }

    #[test]
    fn test_last_page_needs_boxes() {
        let form = planned_form();
        let derived = derive(&RecipeInputs::from_form(&form, now()), None);
        let checked = all_boxes();
        let mut c = ctx(&form, &checked, &derived);
        assert!(validate_step(4, &c).is_ok());
        c.finish_steps = 0;
        assert!(!validate_step(4, &c).is_ok());
    }

    #[test]
    fn test_transitions() {
        let form = planned_form();
        let derived = derive(&RecipeInputs::from_form(&form, now()), None);
        let empty = BTreeSet::new();
        let c = ctx(&form, &empty, &derived);

        let mut w = Wizard::default();
        assert_eq!(w.prev(), Transition::Stay);
        assert_eq!(w.next(&c), Transition::Move(2));
        w.set(2);
        assert!(matches!(w.next(&c), Transition::Blocked(_)));
        assert_eq!(w.jump(3, &c), Transition::Stay);
        assert_eq!(w.jump(1, &c), Transition::Move(1));
        assert_eq!(w.prev(), Transition::Move(1));

        let all = all_boxes();
        let c = ctx(&form, &all, &derived);
        w.set(4);
        assert_eq!(w.next(&c), Transition::Finish);
        assert_eq!(w.set(9), 4);
        assert_eq!(w.set(0), 1);
    }

    #[test]
    fn test_fragments() {
        assert_eq!(fragment(3), "#step-3");
        assert_eq!(parse_fragment("#step-3").unwrap(), 3);
        assert_eq!(parse_fragment("step-2").unwrap(), 2);
        assert_eq!(parse_fragment("4").unwrap(), 4);
        assert_eq!(parse_fragment("#step-2abc").unwrap(), 2);
        assert!(parse_fragment("#step-x2").is_err());
        assert!(matches!(
            parse_fragment("#about"),
            Err(DoughError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_initial_step_resolution() {
        assert_eq!(initial_step(Some("#step-3"), Some("2"), 4, 4), 3);
        assert_eq!(initial_step(Some("#nope"), Some("2"), 4, 4), 2);
        assert_eq!(initial_step(None, None, 4, 4), 1);
        assert_eq!(initial_step(Some("#step-9"), None, 4, 4), 4);
        assert_eq!(initial_step(Some("#step-4"), None, 2, 4), 2);
        assert_eq!(initial_step(None, Some("junk"), 1, 4), 1);
    }
}
