//! Event handling for the calculator: every user action goes through
//! [`Controller`], which recomputes the recipe, persists the form and tells
//! the presenter what to show. Handlers run to completion one at a time.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use serde::Serialize;

use crate::engine::{DerivedRecipe, derive};
use crate::inputs::{
    Checkbox, DEFAULT_FINISH_STEPS, Field, FormValues, POOLISH_CHECKS, RecipeInputs,
    default_eat_date, default_eat_time,
};
use crate::lock::PoolishLock;
use crate::store::{CURRENT_STEP_KEY, KeyValueStore, Namespaced};
use crate::wizard::{
    StepContext, TOTAL_STEPS, Transition, Wizard, fragment, initial_step, max_reachable_step,
};

/// A blocking notice the user has to act on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    /// The locked poolish no longer fits: unlock it or go back to the plan.
    PoolishTooBig { flour_g: i64, water_g: i64 },
}

/// Navigation state for the stepper and the prev/next buttons.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepView {
    pub step: usize,
    pub total: usize,
    /// Steps after this one are locked in the stepper.
    pub max_reachable: usize,
    pub can_go_back: bool,
    pub can_advance: bool,
    /// "Next", or "Finish" on the last step.
    pub next_label: &'static str,
    pub fragment: String,
}

/// Whatever draws the calculator.
pub trait Presenter {
    fn render_recipe(&mut self, recipe: &DerivedRecipe);
    fn show_step(&mut self, view: &StepView);
    /// An empty list clears previously shown errors.
    fn show_errors(&mut self, step: usize, messages: &[String]);
    /// `None` closes the advisory.
    fn show_advisory(&mut self, advisory: Option<&Advisory>);
}

pub type Clock = Box<dyn Fn() -> NaiveDateTime>;

pub struct Controller<S, P> {
    store: Namespaced<S>,
    presenter: P,
    form: FormValues,
    checked: BTreeSet<Checkbox>,
    derived: DerivedRecipe,
    wizard: Wizard,
    advisory: Option<Advisory>,
    finish_steps: u8,
    clock: Clock,
}

impl<S: KeyValueStore, P: Presenter> Controller<S, P> {
    pub fn new(store: S, presenter: P) -> Self {
        Self::with_clock(store, presenter, Box::new(|| Local::now().naive_local()))
    }

    pub fn with_clock(store: S, presenter: P, clock: Clock) -> Self {
        let form = FormValues::default();
        let derived = derive(&RecipeInputs::from_form(&form, clock()), None);
        Self {
            store: Namespaced::new(store),
            presenter,
            form,
            checked: BTreeSet::new(),
            derived,
            wizard: Wizard::new(TOTAL_STEPS),
            advisory: None,
            finish_steps: DEFAULT_FINISH_STEPS,
            clock,
        }
    }

    /// Number of checkboxes on the last page.
    pub fn finish_steps(mut self, n: u8) -> Self {
        self.finish_steps = n;
        self
    }

    /// Restore persisted state and show the addressed step.
    pub fn boot(&mut self, route: Option<&str>) {
        self.apply_date_time_defaults();
        self.restore_form();
        self.refresh();
        self.ensure_lock_consistency();

        let stored = self.store.get(CURRENT_STEP_KEY);
        let step = initial_step(
            route,
            stored.as_deref(),
            self.max_reachable(),
            self.wizard.total(),
        );
        debug!("booting at step {step}");
        self.wizard.set(step);
        self.show_current();
    }

    pub fn form(&self) -> &FormValues {
        &self.form
    }

    pub fn derived(&self) -> &DerivedRecipe {
        &self.derived
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref()
    }

    pub fn is_checked(&self, checkbox: Checkbox) -> bool {
        self.checked.contains(&checkbox)
    }

    pub fn lock(&self) -> Option<PoolishLock> {
        PoolishLock::load(&self.store)
    }

    pub fn store(&self) -> &S {
        self.store.inner()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn into_parts(self) -> (S, P) {
        (self.store.into_inner(), self.presenter)
    }

    /// Checkboxes on the current page layout.
    pub fn checkboxes(&self) -> Vec<Checkbox> {
        Checkbox::all(self.finish_steps)
    }

    fn ctx(&self) -> StepContext<'_> {
        StepContext {
            form: &self.form,
            checked: &self.checked,
            derived: &self.derived,
            finish_steps: self.finish_steps,
        }
    }

    pub fn max_reachable(&self) -> usize {
        max_reachable_step(&self.ctx(), self.wizard.total())
    }

    /// A form field was edited.
    pub fn set_field(&mut self, field: Field, value: &str) {
        debug!("{} = {value:?}", field.id());
        self.form.set(field, value);
        self.sync();
    }

    /// A checkbox was toggled. Poolish boxes also take or release the lock.
    pub fn set_checkbox(&mut self, checkbox: Checkbox, checked: bool) {
        if !self.checkboxes().contains(&checkbox) {
            warn!("ignoring unknown checkbox {checkbox}");
            return;
        }
        if checked {
            self.checked.insert(checkbox);
        } else {
            self.checked.remove(&checkbox);
        }
        if checkbox.is_poolish() {
            self.apply_poolish_lock();
        }
        self.sync();
    }

    pub fn next(&mut self) -> Transition {
        let step = self.wizard.current();
        let transition = self.wizard.next(&self.ctx());
        match &transition {
            Transition::Move(to) => {
                self.presenter.show_errors(step, &[]);
                self.go_to(*to);
            }
            Transition::Finish => {
                self.presenter.show_errors(step, &[]);
                self.reset();
            }
            Transition::Blocked(validation) => {
                debug!("step {step} blocked: {:?}", validation.messages);
                self.presenter.show_errors(step, &validation.messages);
                if validation.poolish_too_big {
                    self.set_advisory(Some(self.too_big_advisory()));
                }
                self.publish_nav();
            }
            Transition::Stay => {}
        }
        transition
    }

    pub fn prev(&mut self) -> Transition {
        let transition = self.wizard.prev();
        if let Transition::Move(to) = transition {
            self.go_to(to);
        }
        transition
    }

    /// Stepper click: only steps up to the first invalid one are open.
    pub fn jump(&mut self, target: usize) -> Transition {
        let transition = self.wizard.jump(target, &self.ctx());
        match transition {
            Transition::Move(to) => self.go_to(to),
            _ => debug!("step {target} is locked"),
        }
        transition
    }

    /// The route changed outside our control (e.g. the address bar).
    pub fn route_changed(&mut self, route: &str) {
        let stored = self.store.get(CURRENT_STEP_KEY);
        let step = initial_step(
            Some(route),
            stored.as_deref(),
            self.max_reachable(),
            self.wizard.total(),
        );
        self.go_to(step);
    }

    /// Start over: default inputs, nothing checked, every persisted key gone.
    pub fn reset(&mut self) {
        info!("resetting calculator");
        self.form = FormValues::default();
        self.checked.clear();
        self.store.clear();
        self.apply_date_time_defaults();
        self.refresh();
        self.go_to(1);
    }

    /// Advisory action: drop the lock and untick the poolish steps.
    pub fn unlock_poolish(&mut self) {
        PoolishLock::clear(&mut self.store);
        for checkbox in POOLISH_CHECKS {
            self.checked.remove(&checkbox);
        }
        self.set_advisory(None);
        self.sync();
    }

    /// Advisory action: go back to the plan and adjust it.
    pub fn back_to_plan(&mut self) {
        self.go_to(1);
        self.set_advisory(None);
    }

    /// Close the advisory without acting. The next recompute may reopen it.
    pub fn dismiss_advisory(&mut self) {
        self.set_advisory(None);
    }

    fn sync(&mut self) {
        self.refresh();
        self.save_form();
        self.publish_nav();
    }

    fn refresh(&mut self) {
        let inputs = RecipeInputs::from_form(&self.form, (self.clock)());
        let lock = PoolishLock::load(&self.store);
        self.derived = derive(&inputs, lock.as_ref());
        self.presenter.render_recipe(&self.derived);

        let advisory = (self.derived.poolish_too_big && self.wizard.current() >= 2)
            .then(|| self.too_big_advisory());
        self.set_advisory(advisory);
    }

    fn too_big_advisory(&self) -> Advisory {
        Advisory::PoolishTooBig {
            flour_g: self.derived.poolish_flour_g,
            water_g: self.derived.poolish_water_g,
        }
    }

    fn set_advisory(&mut self, advisory: Option<Advisory>) {
        if self.advisory == advisory {
            return;
        }
        match &advisory {
            Some(a) => info!("advisory raised: {a:?}"),
            None => debug!("advisory closed"),
        }
        self.advisory = advisory;
        self.presenter.show_advisory(self.advisory.as_ref());
    }

    /// Leaving the plan page confirms it, defaulted eat date/time included.
    fn go_to(&mut self, step: usize) {
        let step = self.wizard.set(step);
        info!("showing step {step}");
        if step > 1 {
            self.save_form();
        }
        self.store.set(CURRENT_STEP_KEY, &step.to_string());
        self.show_current();
    }

    fn show_current(&mut self) {
        self.refresh();
        self.publish_nav();
    }

    fn publish_nav(&mut self) {
        let step = self.wizard.current();
        let view = StepView {
            step,
            total: self.wizard.total(),
            max_reachable: self.max_reachable(),
            can_go_back: step > 1,
            can_advance: self.wizard.can_advance(&self.ctx()),
            next_label: if self.wizard.is_last() { "Finish" } else { "Next" },
            fragment: fragment(step),
        };
        self.presenter.show_step(&view);
    }

    fn all_poolish_checked(&self) -> bool {
        POOLISH_CHECKS.iter().all(|c| self.checked.contains(c))
    }

    /// Lock the poolish at its current size when every poolish step is
    /// ticked, release it otherwise.
    fn apply_poolish_lock(&mut self) {
        if self.all_poolish_checked() {
            PoolishLock::new(self.derived.poolish_flour_g, self.derived.poolish_water_g)
                .save(&mut self.store);
        } else {
            PoolishLock::clear(&mut self.store);
        }
    }

    /// Persisted checkboxes and the lock can disagree after a partial write.
    fn ensure_lock_consistency(&mut self) {
        let locked = PoolishLock::load(&self.store).is_some();
        let all = self.all_poolish_checked();
        if locked != all {
            debug!("repairing poolish lock (locked={locked}, all checked={all})");
            self.apply_poolish_lock();
            self.refresh();
        }
    }

    fn apply_date_time_defaults(&mut self) {
        let now = (self.clock)();
        if self.store.get(Field::EatDate.id()).is_none() {
            self.form.eat_date = default_eat_date(now);
        }
        if self.store.get(Field::EatTime.id()).is_none() {
            self.form.eat_time = default_eat_time(now);
        }
    }

    fn restore_form(&mut self) {
        for field in Field::ALL {
            if let Some(value) = self.store.get(field.id()) {
                self.form.set(field, value);
            }
        }
        for checkbox in self.checkboxes() {
            match self.store.get_bool(&checkbox.id()) {
                Some(true) => {
                    self.checked.insert(checkbox);
                }
                Some(false) => {
                    self.checked.remove(&checkbox);
                }
                None => {}
            }
        }
    }

    fn save_form(&mut self) {
        for field in Field::ALL {
            self.store.set(field.id(), self.form.get(field));
        }
        for checkbox in self.checkboxes() {
            let checked = self.checked.contains(&checkbox);
            self.store.set_bool(&checkbox.id(), checked);
        }
    }
}
