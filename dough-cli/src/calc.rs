//! Stateless `calc` command: inputs from flags and an optional profile.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Local;
use clap::{Args, Parser, ValueEnum};
use dough_core::inputs::{default_eat_date, default_eat_time};
use dough_core::wizard::{StepContext, validate_step};
use dough_core::{FormValues, PoolishLock, RecipeInputs, YeastType, derive};
use serde::{Deserialize, Serialize};

use crate::render;

/// Yeast CLI enum mirrors dough-core (derive for Clap).
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YeastFlag {
    InstantDry,
    Fresh,
}

impl From<YeastFlag> for YeastType {
    fn from(y: YeastFlag) -> Self {
        match y {
            YeastFlag::InstantDry => YeastType::InstantDry,
            YeastFlag::Fresh => YeastType::Fresh,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CalcArgs {
    /// Number of portions
    #[arg(long, default_value_t = 2)]
    portions: i64,

    /// Portion weight in grams
    #[arg(long, default_value_t = 280)]
    portion_size: i64,

    /// Hydration in % of flour (50..85)
    #[arg(long, default_value_t = 70)]
    hydration: i64,

    /// Salt in % of flour (1..4)
    #[arg(long, default_value_t = 3.0)]
    salt: f64,

    /// Yeast type
    #[arg(long, value_enum, default_value_t = YeastFlag::InstantDry)]
    yeast: YeastFlag,

    /// Eat date YYYY-MM-DD; defaults to today
    #[arg(long)]
    eat_date: Option<String>,

    /// Eat time HH:MM; defaults to the next full hour
    #[arg(long)]
    eat_time: Option<String>,

    /// Pretend a poolish of this many grams (flour = water) is already mixed
    #[arg(long)]
    locked_poolish: Option<i64>,

    /// Load a profile JSON before applying CLI overrides
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Save the effective parameters to a profile JSON
    #[arg(long)]
    save_profile: Option<PathBuf>,
}

/// Used only to get the flag defaults for profile merging.
#[derive(Parser)]
struct DefaultCalc {
    #[command(flatten)]
    args: CalcArgs,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    portions: i64,
    portion_size: i64,
    hydration: i64,
    salt: f64,
    yeast: YeastFlag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    eat_time: Option<String>,
}

impl From<&CalcArgs> for Profile {
    fn from(a: &CalcArgs) -> Self {
        Profile {
            portions: a.portions,
            portion_size: a.portion_size,
            hydration: a.hydration,
            salt: a.salt,
            yeast: a.yeast,
            eat_time: a.eat_time.clone(),
        }
    }
}

fn load_profile(path: &Path) -> Result<Profile> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile: {}", path.display()))?;
    serde_json::from_str(&txt).with_context(|| format!("Invalid profile JSON: {}", path.display()))
}

/// Profile values fill in every flag left at its default (CLI wins).
fn merge_profile(args: &mut CalcArgs, p: Profile) {
    let def = DefaultCalc::parse_from(["dough"]).args;

    macro_rules! take {
        ($field:ident) => {
            if args.$field == def.$field {
                p.$field
            } else {
                args.$field.clone()
            }
        };
    }

    args.portions = take!(portions);
    args.portion_size = take!(portion_size);
    args.hydration = take!(hydration);
    args.salt = take!(salt);
    args.yeast = take!(yeast);
    if args.eat_time.is_none() {
        args.eat_time = p.eat_time;
    }
}

impl CalcArgs {
    fn form(&self, now: chrono::NaiveDateTime) -> FormValues {
        FormValues {
            portions: self.portions.to_string(),
            portion_size: self.portion_size.to_string(),
            hydration: self.hydration.to_string(),
            salt: self.salt.to_string(),
            yeast_type: YeastType::from(self.yeast).as_str().to_string(),
            eat_date: self.eat_date.clone().unwrap_or_else(|| default_eat_date(now)),
            eat_time: self.eat_time.clone().unwrap_or_else(|| default_eat_time(now)),
        }
    }
}

pub fn run(mut args: CalcArgs, json: bool) -> Result<()> {
    if let Some(path) = args.profile.clone() {
        let profile = load_profile(&path)?;
        merge_profile(&mut args, profile);
    }

    if let Some(path) = &args.save_profile {
        let txt = serde_json::to_string_pretty(&Profile::from(&args))?;
        fs::write(path, txt)
            .with_context(|| format!("Failed to save profile: {}", path.display()))?;
        eprintln!("Profile saved to {}", path.display());
    }

    let now = Local::now().naive_local();
    let form = args.form(now);
    let lock = args.locked_poolish.map(|g| PoolishLock::new(g, 0));
    let recipe = derive(&RecipeInputs::from_form(&form, now), lock.as_ref());

    let checked = BTreeSet::new();
    let validation = validate_step(
        1,
        &StepContext {
            form: &form,
            checked: &checked,
            derived: &recipe,
            finish_steps: 0,
        },
    );
    if !validation.is_ok() {
        bail!(validation.messages.join("\n"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
        return Ok(());
    }

    render::print_recipe(&form, &recipe);
    if recipe.poolish_too_big {
        println!(
            "\n! A {} g poolish no longer fits this recipe; \
             drop --locked-poolish to size it automatically.",
            recipe.poolish_flour_g
        );
    }
    Ok(())
}
