use chrono::Local;
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use dough_core::engine::LARGE_BATCH_PORTIONS;
use dough_core::{
    Advisory, Checkbox, Controller, DerivedRecipe, FormValues, KeyValueStore, Presenter, StepView,
    YeastType,
};
use serde::Serialize;

/// Collects what the controller wants shown; printed once per command.
#[derive(Debug, Default)]
pub struct Screen {
    recipe: Option<DerivedRecipe>,
    view: Option<StepView>,
    errors: Vec<String>,
    advisory: Option<Advisory>,
}

impl Screen {
    /// Forget messages produced while booting.
    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

impl Presenter for Screen {
    fn render_recipe(&mut self, recipe: &DerivedRecipe) {
        self.recipe = Some(*recipe);
    }

    fn show_step(&mut self, view: &StepView) {
        self.view = Some(view.clone());
    }

    fn show_errors(&mut self, _step: usize, messages: &[String]) {
        self.errors = messages.to_vec();
    }

    fn show_advisory(&mut self, advisory: Option<&Advisory>) {
        self.advisory = advisory.copied();
    }
}

pub fn step_title(step: usize) -> &'static str {
    match step {
        1 => "Plan",
        2 => "Poolish",
        3 => "Final mix",
        4 => "Finish",
        _ => "",
    }
}

fn checkbox_label(checkbox: Checkbox) -> String {
    match checkbox {
        Checkbox::Poolish(1) => "Mix flour, water, yeast and honey".to_string(),
        Checkbox::Poolish(2) => "Cover and leave to ferment".to_string(),
        Checkbox::Poolish(3) => "Poolish bubbly and domed".to_string(),
        Checkbox::Poolish(n) => format!("Poolish step {n}"),
        Checkbox::FinalMix => "Final dough mixed".to_string(),
        Checkbox::Finish(n) => format!("Finishing step {n}"),
    }
}

/// Which step page a checkbox sits on.
fn checkbox_step(checkbox: Checkbox) -> usize {
    match checkbox {
        Checkbox::Poolish(_) => 2,
        Checkbox::FinalMix => 3,
        Checkbox::Finish(_) => 4,
    }
}

pub fn fmt_g(x: f64) -> String {
    let v = (x * 10.0).round() / 10.0;
    if (v - v.round()).abs() < 1e-9 {
        format!("{:.0} g", v)
    } else {
        format!("{:.1} g", v)
    }
}

fn header(cols: [&str; 3]) -> Vec<Cell> {
    cols.into_iter()
        .map(|c| Cell::new(c).add_attribute(Attribute::Bold))
        .collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn yeast_name(yeast: YeastType) -> &'static str {
    match yeast {
        YeastType::InstantDry => "Instant dry yeast",
        YeastType::Fresh => "Fresh yeast",
    }
}

/// Ingredient tables for a derived recipe.
pub fn recipe_tables(form: &FormValues, r: &DerivedRecipe) -> (Table, Table) {
    let mut poolish = new_table();
    poolish.set_header(header(["Poolish", "Amount", "Notes"]));
    let lock_note = if r.locked { "locked" } else { "" };
    poolish.add_row(vec![
        Cell::new("Flour"),
        Cell::new(format!("{} g", r.poolish_flour_g)),
        Cell::new(lock_note),
    ]);
    poolish.add_row(vec![
        Cell::new("Water"),
        Cell::new(format!("{} g", r.poolish_water_g)),
        Cell::new(lock_note),
    ]);
    poolish.add_row(vec![
        Cell::new(yeast_name(r.yeast)),
        Cell::new(fmt_g(r.poolish_yeast_g)),
        Cell::new(match r.yeast {
            YeastType::InstantDry => "1.5% of poolish flour",
            YeastType::Fresh => "~3× instant dry",
        }),
    ]);
    poolish.add_row(vec![
        Cell::new("Honey"),
        Cell::new(fmt_g(r.poolish_honey_g)),
        Cell::new("1.5% of poolish flour"),
    ]);

    let mut dough = new_table();
    dough.set_header(header(["Final dough", "Add", "Recipe total"]));
    dough.add_row(vec![
        Cell::new("Portions"),
        Cell::new(format!("{} × {} g", form.portions, form.portion_size)),
        Cell::new(format!("{} g", r.total_dough_g)),
    ]);
    dough.add_row(vec![
        Cell::new("Flour"),
        Cell::new(format!("{} g", r.remaining_flour_g)),
        Cell::new(format!("{} g", DerivedRecipe::display_g(r.flour_g))),
    ]);
    dough.add_row(vec![
        Cell::new("Water"),
        Cell::new(format!("{} g", r.remaining_water_g)),
        Cell::new(format!("{} g (H={}%)", DerivedRecipe::display_g(r.water_g), form.hydration)),
    ]);
    dough.add_row(vec![
        Cell::new("Salt"),
        Cell::new(format!("{} g", r.remaining_salt_g)),
        Cell::new(format!("{} g ({}%)", DerivedRecipe::display_g(r.salt_g), form.salt)),
    ]);

    (poolish, dough)
}

pub fn print_recipe(form: &FormValues, r: &DerivedRecipe) {
    let (poolish, dough) = recipe_tables(form, r);
    println!("\n=== Poolish ===");
    println!("{poolish}");
    println!("\n=== Final dough ===");
    println!("{dough}");

    let now = Local::now().naive_local();
    let mark = |inside: bool| if inside { "  ← now" } else { "" };
    println!("\n=== Timing ===");
    println!(
        "- Start poolish: {}{}",
        r.schedule.poolish_start,
        mark(r.schedule.poolish_start.contains(now))
    );
    println!(
        "- Final mix:     {}{}",
        r.schedule.final_mix,
        mark(r.schedule.final_mix.contains(now))
    );

    if r.large_batch {
        println!(
            "\n! More than {LARGE_BATCH_PORTIONS} portions: \
             consider splitting into several batches."
        );
    }
}

fn stepper(view: &StepView) -> String {
    (1..=view.total)
        .map(|i| {
            let state = if i == view.step {
                "•"
            } else if i > view.max_reachable {
                "locked"
            } else if i < view.step {
                "✓"
            } else {
                " "
            };
            format!("[{i} {} {state}]", step_title(i))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Full human-readable screen for the controller's current state.
pub fn print_screen<S: KeyValueStore>(ctl: &Controller<S, Screen>) {
    let screen = ctl.presenter();
    let Some(view) = &screen.view else {
        return;
    };

    println!("{}", stepper(view));
    println!(
        "\n=== Step {} of {}: {} ({}) ===",
        view.step,
        view.total,
        step_title(view.step),
        view.fragment
    );

    if view.step == 1 {
        let form = ctl.form();
        println!("Eat at:       {} {}", form.eat_date, form.eat_time);
        println!("Portions:     {} × {} g", form.portions, form.portion_size);
        println!("Hydration:    {}%", form.hydration);
        println!("Salt:         {}%", form.salt);
        println!("Yeast:        {}", form.yeast_type);
    }

    if let Some(recipe) = &screen.recipe {
        print_recipe(ctl.form(), recipe);
    }

    let boxes: Vec<Checkbox> = ctl
        .checkboxes()
        .into_iter()
        .filter(|c| checkbox_step(*c) == view.step)
        .collect();
    if !boxes.is_empty() {
        println!("\n=== Checklist ===");
        for c in boxes {
            let tick = if ctl.is_checked(c) { "x" } else { " " };
            println!("[{tick}] {:<16} {}", c.id(), checkbox_label(c));
        }
    }

    if !screen.errors.is_empty() {
        println!("\nCannot continue:");
        for e in &screen.errors {
            println!("• {e}");
        }
    }

    if let Some(Advisory::PoolishTooBig { flour_g, water_g }) = screen.advisory {
        println!(
            "\n!!! Your locked poolish ({flour_g} g flour / {water_g} g water) \
             is larger than the recipe now needs."
        );
        println!(
            "!!! Run `unlock` to size it automatically again, \
             or `back-to-plan` to adjust the plan."
        );
    }

    let back = if view.can_go_back { "prev" } else { "-" };
    let next = if view.can_advance { view.next_label } else { "(blocked)" };
    println!("\n[{back}]  [{next}]");
}

#[derive(Serialize)]
struct ScreenJson<'a> {
    view: Option<&'a StepView>,
    form: &'a FormValues,
    recipe: Option<&'a DerivedRecipe>,
    checked: Vec<String>,
    errors: &'a [String],
    advisory: Option<&'a Advisory>,
}

pub fn screen_json<S: KeyValueStore>(ctl: &Controller<S, Screen>) -> serde_json::Result<String> {
    let screen = ctl.presenter();
    let checked = ctl
        .checkboxes()
        .into_iter()
        .filter(|c| ctl.is_checked(*c))
        .map(|c| c.id())
        .collect();
    serde_json::to_string_pretty(&ScreenJson {
        view: screen.view.as_ref(),
        form: ctl.form(),
        recipe: screen.recipe.as_ref(),
        checked,
        errors: &screen.errors,
        advisory: screen.advisory.as_ref(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_g() {
        assert_eq!(fmt_g(3.0), "3 g");
        assert_eq!(fmt_g(4.5), "4.5 g");
        assert_eq!(fmt_g(8.999), "9 g");
    }

    #[test]
    fn test_stepper_marks() {
        let view = StepView {
            step: 2,
            total: 4,
            max_reachable: 2,
            can_go_back: true,
            can_advance: false,
            next_label: "Next",
            fragment: "#step-2".to_string(),
        };
        assert_eq!(
            stepper(&view),
            "[1 Plan ✓] [2 Poolish •] [3 Final mix locked] [4 Finish locked]"
        );
    }
}
