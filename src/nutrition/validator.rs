use std::fmt;

use serde::{Deserialize, Serialize};

use super::answers::Preference;
use super::numeric::{leading_float, leading_int};

/// One question of the wizard, in collection order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    #[default]
    Peso,
    Altura,
    Edad,
    Restricciones,
    Preferencia,
    Dias,
}

impl Step {
    pub const ORDER: [Step; 6] = [
        Step::Peso,
        Step::Altura,
        Step::Edad,
        Step::Restricciones,
        Step::Preferencia,
        Step::Dias,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Peso => "peso",
            Step::Altura => "altura",
            Step::Edad => "edad",
            Step::Restricciones => "restricciones",
            Step::Preferencia => "preferencia",
            Step::Dias => "dias",
        }
    }

    pub fn from_name(name: &str) -> Option<Step> {
        Step::ORDER.into_iter().find(|s| s.as_str() == name)
    }

    pub fn next(self) -> Option<Step> {
        let idx = Step::ORDER.iter().position(|s| *s == self)?;
        Step::ORDER.get(idx + 1).copied()
    }

    pub fn is_last(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks a raw answer against the constraints of `step`. Never fails loudly.
pub fn validate(step: Step, raw: &str) -> bool {
    match step {
        Step::Peso => in_open_range(leading_float(raw), 300.0),
        Step::Altura => in_open_range(leading_float(raw), 250.0),
        Step::Edad => in_open_range(leading_float(raw), 120.0),
        Step::Restricciones => !raw.trim().is_empty(),
        Step::Preferencia => Preference::from_input(raw).is_some(),
        Step::Dias => matches!(leading_int(raw), Some(d) if d > 0 && d <= 7),
    }
}

/// Same as [`validate`] for a step given by name; unknown names are invalid.
pub fn validate_named(step: &str, raw: &str) -> bool {
    Step::from_name(step).map_or(false, |s| validate(s, raw))
}

fn in_open_range(value: Option<f64>, upper: f64) -> bool {
    matches!(value, Some(v) if v > 0.0 && v < upper)
}
