//! Field rules and the search form pipeline.
//!
//! Rules are pure functions over already-trimmed strings. They never fail with an
//! `Err`: a bad input is reported through [`ValidationResult`] so the caller can
//! render every field's message at once.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::manifest::{ManifestCache, MissionManifest};

pub const REQUIRED_MESSAGE: &str = "Input is required here";
pub const DATE_OR_SOL_MESSAGE: &str = "please enter a SOL number or a valid date";
const RANGE_PREFIX: &str = "the mission you've selected requires a";

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})$").unwrap());
static SOL_SHAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Empty when the input is valid.
    pub message: String,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
        }
    }

    fn check(is_valid: bool, message: impl FnOnce() -> String) -> Self {
        if is_valid {
            Self::valid()
        } else {
            Self::invalid(message())
        }
    }
}

/// A date/SOL field value that passed the format rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrSol {
    Date(NaiveDate),
    Sol(u64),
}

impl DateOrSol {
    pub fn parse(input: &str) -> Option<Self> {
        if is_sol(input) {
            return input.parse().ok().map(DateOrSol::Sol);
        }
        parse_date(input).map(DateOrSol::Date)
    }
}

/// True when the input is one or more ASCII digits, i.e. queried as a SOL.
pub fn is_sol(input: &str) -> bool {
    SOL_SHAPE.is_match(input)
}

/// Parses `YYYY-M-D` (one or two digit month and day) into a real calendar date.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let caps = DATE_SHAPE.captures(input)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn is_not_empty(input: &str) -> ValidationResult {
    ValidationResult::check(!input.is_empty(), || REQUIRED_MESSAGE.to_string())
}

pub fn has_date_or_sol(input: &str) -> ValidationResult {
    ValidationResult::check(parse_date(input).is_some() || is_sol(input), || {
        DATE_OR_SOL_MESSAGE.to_string()
    })
}

/// Checks the date or SOL against the selected mission's range.
///
/// Numeric input is a SOL and must not exceed the mission's latest SOL. Anything
/// else is a calendar date that must fall between landing and the latest Earth date,
/// both inclusive.
pub fn date_or_sol_is_valid(input: &str, manifest: &MissionManifest) -> ValidationResult {
    let sol_message = || format!("{RANGE_PREFIX} SOL before {}", manifest.most_recent_sol);

    match DateOrSol::parse(input) {
        Some(DateOrSol::Sol(sol)) => {
            ValidationResult::check(sol <= manifest.most_recent_sol, sol_message)
        }
        Some(DateOrSol::Date(date)) if date < manifest.landing_date => ValidationResult::invalid(
            format!("{RANGE_PREFIX} date after {}", manifest.landing_date),
        ),
        Some(DateOrSol::Date(date)) if date > manifest.most_recent_earth_date => {
            ValidationResult::invalid(format!(
                "{RANGE_PREFIX} date before {}",
                manifest.most_recent_earth_date
            ))
        }
        Some(DateOrSol::Date(_)) => ValidationResult::valid(),
        // Digit strings too long for u64 are necessarily past the latest SOL.
        None if is_sol(input) => ValidationResult::invalid(sol_message()),
        None => ValidationResult::invalid(DATE_OR_SOL_MESSAGE),
    }
}

/// The rover must name one of the tracked missions.
pub fn is_known_mission(input: &str, missions: &[String]) -> ValidationResult {
    let known = missions.iter().any(|m| m.eq_ignore_ascii_case(input));
    ValidationResult::check(known, || {
        format!("please select one of: {}", missions.join(", "))
    })
}

/// Raw values of the three search form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInput {
    pub date_or_sol: String,
    pub rover: String,
    pub camera: String,
}

impl FormInput {
    pub fn new(
        date_or_sol: impl Into<String>,
        rover: impl Into<String>,
        camera: impl Into<String>,
    ) -> Self {
        Self {
            date_or_sol: date_or_sol.into(),
            rover: rover.into(),
            camera: camera.into(),
        }
    }

    /// Trimmed copy, the form the rules expect.
    pub fn normalized(&self) -> Self {
        Self {
            date_or_sol: self.date_or_sol.trim().to_string(),
            rover: self.rover.trim().to_lowercase(),
            camera: self.camera.trim().to_string(),
        }
    }
}

/// Results of the rules run for one field during a single pass, in order.
///
/// A rule only runs while every earlier rule for the field passed, so the last
/// entry is either the first failure or the final passing check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValidationOutcome {
    runs: Vec<ValidationResult>,
}

impl FieldValidationOutcome {
    fn then(&mut self, rule: impl FnOnce() -> ValidationResult) -> &mut Self {
        if self.passed() {
            self.runs.push(rule());
        }
        self
    }

    fn passed(&self) -> bool {
        self.runs.iter().all(|r| r.is_valid)
    }

    pub fn runs(&self) -> &[ValidationResult] {
        &self.runs
    }

    pub fn is_valid(&self) -> bool {
        !self.runs.is_empty() && self.passed()
    }

    /// Message to show next to the field, if any.
    pub fn message(&self) -> Option<&str> {
        self.runs
            .last()
            .filter(|r| !r.is_valid)
            .map(|r| r.message.as_str())
    }
}

/// Outcome of one validation pass over the whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidation {
    pub date_or_sol: FieldValidationOutcome,
    pub rover: FieldValidationOutcome,
    pub camera: FieldValidationOutcome,
    /// Whether the mission range check ran. When it is skipped the date field
    /// carries no range result at all, never one from an earlier pass.
    pub range_checked: bool,
}

impl FormValidation {
    pub fn is_valid(&self) -> bool {
        self.range_checked
            && self.date_or_sol.is_valid()
            && self.rover.is_valid()
            && self.camera.is_valid()
    }

    /// `(field, message)` for every field that currently shows an error.
    pub fn errors(&self) -> Vec<(&'static str, &str)> {
        [
            ("date_or_sol", &self.date_or_sol),
            ("rover", &self.rover),
            ("camera", &self.camera),
        ]
        .into_iter()
        .filter_map(|(field, outcome)| outcome.message().map(|m| (field, m)))
        .collect()
    }
}

/// Runs every field's rules against a ready manifest cache.
///
/// Emptiness is checked for all three fields unconditionally. Format and mission
/// checks only follow a passing emptiness check. The range check needs both the
/// date/SOL and the rover to have passed, since the rover picks the manifest.
pub fn validate_form(input: &FormInput, manifests: &ManifestCache) -> FormValidation {
    let input = input.normalized();
    let mut form = FormValidation::default();

    form.date_or_sol
        .then(|| is_not_empty(&input.date_or_sol))
        .then(|| has_date_or_sol(&input.date_or_sol));
    form.rover
        .then(|| is_not_empty(&input.rover))
        .then(|| is_known_mission(&input.rover, manifests.required()));
    form.camera.then(|| is_not_empty(&input.camera));

    if form.date_or_sol.is_valid() && form.rover.is_valid() {
        if let Some(manifest) = manifests.get(&input.rover) {
            form.date_or_sol
                .then(|| date_or_sol_is_valid(&input.date_or_sol, manifest));
            form.range_checked = true;
        } else {
            log::warn!(
                "range check for '{}' skipped: manifest not loaded",
                input.rover
            );
        }
    }

    form
}
