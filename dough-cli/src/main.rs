mod calc;
mod file_store;
mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dough_core::wizard::parse_fragment;
use dough_core::{Checkbox, Controller, Field, Transition};
use log::info;

use crate::calc::CalcArgs;
use crate::file_store::JsonFileStore;
use crate::render::Screen;

#[derive(Parser, Debug)]
#[command(
    name = "dough",
    about = "Poolish dough calculator with a step-by-step bake plan.",
    version
)]
struct Cli {
    /// State file shared by all commands
    #[arg(long, env = "DOUGHCALC_STORE", default_value = "doughcalc.json", global = true)]
    store: PathBuf,

    /// Step to open, e.g. #step-2 (clamped to the furthest reachable step)
    #[arg(long, global = true)]
    route: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current step
    Show,
    /// Edit an input: portions, portion-size, hydration, salt, yeast, date, time
    Set {
        field: Field,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Tick a checkbox, e.g. poolish-step1, step2, finish-step1
    Check { checkbox: Checkbox },
    /// Untick a checkbox
    Uncheck { checkbox: Checkbox },
    /// Validate the current step and move on (finishing resets)
    Next,
    /// Go back one step
    Prev,
    /// Jump to a step (number or #step-N) if it is reachable
    Goto { step: String },
    /// Release the poolish lock and untick the poolish steps
    Unlock,
    /// Return to the plan to adjust portions
    BackToPlan,
    /// Close the poolish advisory without acting
    Dismiss,
    /// Clear everything and start over
    Reset,
    /// One-off calculation without touching the state file
    Calc(CalcArgs),
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let command = match cli.command {
        Command::Calc(args) => return calc::run(args, cli.json),
        other => other,
    };

    let store = JsonFileStore::open(&cli.store)?;
    let mut ctl = Controller::new(store, Screen::default());
    ctl.boot(cli.route.as_deref());
    ctl.presenter_mut().clear_errors();

    match command {
        Command::Show | Command::Calc(_) => {}
        Command::Set { field, value } => ctl.set_field(field, &value),
        Command::Check { checkbox } => ctl.set_checkbox(checkbox, true),
        Command::Uncheck { checkbox } => ctl.set_checkbox(checkbox, false),
        Command::Next => {
            if ctl.next() == Transition::Finish {
                info!("bake finished, calculator reset");
            }
        }
        Command::Prev => {
            ctl.prev();
        }
        Command::Goto { step } => {
            let target = parse_fragment(&step)?;
            if ctl.jump(target) == Transition::Stay {
                eprintln!(
                    "Step {target} is locked; finish step {} first.",
                    ctl.max_reachable()
                );
            }
        }
        Command::Unlock => ctl.unlock_poolish(),
        Command::BackToPlan => ctl.back_to_plan(),
        Command::Dismiss => ctl.dismiss_advisory(),
        Command::Reset => ctl.reset(),
    }

    if cli.json {
        println!("{}", render::screen_json(&ctl)?);
    } else {
        render::print_screen(&ctl);
    }

    let (mut store, _) = ctl.into_parts();
    store
        .flush()
        .with_context(|| format!("Failed to save state to {}", cli.store.display()))
}
