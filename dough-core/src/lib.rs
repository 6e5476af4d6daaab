//! Poolish bread dough calculator: recipe derivation plus the step-by-step
//! wizard that walks through poolish, final mix and finishing.
//!
//! The core is host-agnostic. Persistence goes through [`KeyValueStore`]
//! and rendering through [`Presenter`]; the CLI provides both.

pub mod controller;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod lock;
pub mod schedule;
pub mod store;
pub mod wizard;

pub use controller::{Advisory, Controller, Presenter, StepView};
pub use engine::{DerivedRecipe, choose_poolish_candidate, derive};
pub use error::{DoughError, Result};
pub use inputs::{Checkbox, Field, FormValues, RecipeInputs, YeastType};
pub use lock::PoolishLock;
pub use schedule::{Schedule, TimeWindow, schedule_for};
pub use store::{KeyValueStore, MemoryStore, Namespaced};
pub use wizard::{Transition, Validation, Wizard};
