//! Typed recipe inputs and the raw form values they are coerced from.
//!
//! The form holds whatever the user is typing; numbers are only read
//! leniently (leading numeric prefix, garbage becomes 0) so the engine can
//! run on every keystroke before validation has a say.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{DoughError, Result};

/// Yeast kind used in the poolish.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum YeastType {
    #[default]
    InstantDry,
    Fresh,
}

impl YeastType {
    /// Mass factor relative to instant dry yeast.
    pub fn factor(self) -> f64 {
        match self {
            YeastType::InstantDry => 1.0,
            YeastType::Fresh => 3.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            YeastType::InstantDry => "instant_dry",
            YeastType::Fresh => "fresh",
        }
    }
}

impl fmt::Display for YeastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for YeastType {
    type Err = DoughError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "instant_dry" => Ok(YeastType::InstantDry),
            "fresh" => Ok(YeastType::Fresh),
            other => Err(DoughError::UnknownYeast(other.to_string())),
        }
    }
}

/// User-editable form fields. The ids double as persistence keys.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Portions,
    PortionSize,
    Hydration,
    Salt,
    YeastType,
    EatDate,
    EatTime,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Portions,
        Field::PortionSize,
        Field::Hydration,
        Field::Salt,
        Field::YeastType,
        Field::EatDate,
        Field::EatTime,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Field::Portions => "inputPortions",
            Field::PortionSize => "inputPortionSize",
            Field::Hydration => "inputHydration",
            Field::Salt => "inputSalt",
            Field::YeastType => "inputYeastType",
            Field::EatDate => "inputDate",
            Field::EatTime => "inputTime",
        }
    }

    /// Short name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Field::Portions => "portions",
            Field::PortionSize => "portion-size",
            Field::Hydration => "hydration",
            Field::Salt => "salt",
            Field::YeastType => "yeast",
            Field::EatDate => "date",
            Field::EatTime => "time",
        }
    }
}

impl FromStr for Field {
    type Err = DoughError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s || f.id() == s)
            .ok_or_else(|| DoughError::UnknownField(s.to_string()))
    }
}

/// Confirmation checkboxes across the wizard pages.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Checkbox {
    /// One of the three poolish preparation steps (1-based).
    Poolish(u8),
    /// The single "final mix done" confirmation.
    FinalMix,
    /// One of the closing steps on the last page (1-based).
    Finish(u8),
}

pub const POOLISH_CHECKS: [Checkbox; 3] = [
    Checkbox::Poolish(1),
    Checkbox::Poolish(2),
    Checkbox::Poolish(3),
];

pub const DEFAULT_FINISH_STEPS: u8 = 3;

impl Checkbox {
    pub fn id(self) -> String {
        match self {
            Checkbox::Poolish(n) => format!("poolish-step{n}"),
            Checkbox::FinalMix => "step2".to_string(),
            Checkbox::Finish(n) => format!("finish-step{n}"),
        }
    }

    pub fn is_poolish(self) -> bool {
        matches!(self, Checkbox::Poolish(_))
    }

    /// Every checkbox on a page layout with `finish_steps` closing boxes.
    pub fn all(finish_steps: u8) -> Vec<Checkbox> {
        let mut boxes = POOLISH_CHECKS.to_vec();
        boxes.push(Checkbox::FinalMix);
        boxes.extend((1..=finish_steps).map(Checkbox::Finish));
        boxes
    }
}

impl fmt::Display for Checkbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for Checkbox {
    type Err = DoughError;

    fn from_str(s: &str) -> Result<Self> {
        let numbered = |prefix: &str| {
            s.strip_prefix(prefix)
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| *n >= 1)
        };
        if s == "step2" || s == "final-mix" {
            return Ok(Checkbox::FinalMix);
        }
        if let Some(n) = numbered("poolish-step").filter(|n| *n <= 3) {
            return Ok(Checkbox::Poolish(n));
        }
        if let Some(n) = numbered("finish-step") {
            return Ok(Checkbox::Finish(n));
        }
        Err(DoughError::UnknownCheckbox(s.to_string()))
    }
}

/// Raw form contents, one string per field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues {
    pub portions: String,
    pub portion_size: String,
    pub hydration: String,
    pub salt: String,
    pub yeast_type: String,
    pub eat_date: String,
    pub eat_time: String,
}

impl Default for FormValues {
    fn default() -> Self {
        Self {
            portions: "2".to_string(),
            portion_size: "280".to_string(),
            hydration: "70".to_string(),
            salt: "3".to_string(),
            yeast_type: YeastType::InstantDry.as_str().to_string(),
            eat_date: String::new(),
            eat_time: String::new(),
        }
    }
}

impl FormValues {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Portions => &self.portions,
            Field::PortionSize => &self.portion_size,
            Field::Hydration => &self.hydration,
            Field::Salt => &self.salt,
            Field::YeastType => &self.yeast_type,
            Field::EatDate => &self.eat_date,
            Field::EatTime => &self.eat_time,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Portions => self.portions = value,
            Field::PortionSize => self.portion_size = value,
            Field::Hydration => self.hydration = value,
            Field::Salt => self.salt = value,
            Field::YeastType => self.yeast_type = value,
            Field::EatDate => self.eat_date = value,
            Field::EatTime => self.eat_time = value,
        }
    }
}

/// Leading integer of `raw`: `"12.7g"` is 12, `"g12"` is nothing.
pub fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// [`parse_int`], anything unreadable is 0.
pub fn coerce_int(raw: &str) -> i64 {
    parse_int(raw).unwrap_or(0)
}

/// Longest leading decimal number in `raw`, if any.
pub fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')))
        .unwrap_or(s.len());
    (1..=end)
        .rev()
        .find_map(|n| s[..n].parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

pub fn coerce_float(raw: &str) -> f64 {
    parse_number(raw).unwrap_or(0.0)
}

/// Parse the eat date (`YYYY-MM-DD`) and time (`HH:MM`, seconds optional).
pub fn parse_eat_at(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Some(date.and_time(time))
}

/// Today's date as a form value.
pub fn default_eat_date(now: NaiveDateTime) -> String {
    now.date().format("%Y-%m-%d").to_string()
}

/// The next full hour, wrapping at midnight without moving the date.
pub fn default_eat_time(now: NaiveDateTime) -> String {
    format!("{:02}:00", (now.hour() + 1) % 24)
}

/// Coerced, typed inputs for the derivation engine.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RecipeInputs {
    pub portions: i64,
    /// Grams per portion.
    pub portion_size_g: i64,
    /// Water as percent of flour (e.g. 70).
    pub hydration_pct: f64,
    /// Salt as percent of flour (e.g. 3.0).
    pub salt_pct: f64,
    pub yeast: YeastType,
    /// When the dough must be ready.
    pub eat_at: NaiveDateTime,
}

impl RecipeInputs {
    /// Read the form the lenient way. A missing or malformed eat date/time
    /// falls back to `now`.
    pub fn from_form(form: &FormValues, now: NaiveDateTime) -> Self {
        Self {
            portions: coerce_int(&form.portions),
            portion_size_g: coerce_int(&form.portion_size),
            hydration_pct: coerce_int(&form.hydration) as f64,
            salt_pct: coerce_float(&form.salt),
            yeast: form.yeast_type.parse().unwrap_or_default(),
            eat_at: parse_eat_at(&form.eat_date, &form.eat_time).unwrap_or(now),
        }
    }
}
