use serde::{Deserialize, Serialize};

use super::numeric::{leading_float, leading_int};
use super::validator::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    Salado,
    Dulce,
    Ambas,
}

impl Preference {
    /// Case-insensitive match against `salado`, `dulce` and `ambas`.
    pub fn from_input(raw: &str) -> Option<Preference> {
        match raw.trim().to_lowercase().as_str() {
            "salado" => Some(Preference::Salado),
            "dulce" => Some(Preference::Dulce),
            "ambas" => Some(Preference::Ambas),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Preference::Salado => "salado",
            Preference::Dulce => "dulce",
            Preference::Ambas => "ambas",
        }
    }
}

/// Answers collected so far. A field stays `None` until its step validates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub peso: Option<f64>,
    pub altura: Option<f64>,
    pub edad: Option<u32>,
    pub restricciones: Option<Vec<String>>,
    pub preferencia: Option<Preference>,
    pub dias: Option<u8>,
}

/// Body sent to the recommendation service once every step is answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub edad: u32,
    pub peso: f64,
    pub altura: f64,
    pub restricciones: Vec<String>,
    pub preferencia: Preference,
    pub dias: u8,
}

impl AnswerRecord {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Coerces an already validated answer and stores it under `step`.
    /// Returns `false` when the text cannot be coerced, leaving the record untouched.
    pub fn record(&mut self, step: Step, raw: &str) -> bool {
        match step {
            Step::Peso => store(&mut self.peso, leading_float(raw)),
            Step::Altura => store(&mut self.altura, leading_float(raw)),
            // ages are whole years; "30.5" is kept as 30, "0.5" is refused
            Step::Edad => store(
                &mut self.edad,
                leading_float(raw)
                    .map(|v| v.trunc() as u32)
                    .filter(|years| *years > 0),
            ),
            Step::Restricciones => store(
                &mut self.restricciones,
                Some(raw.split(',').map(|r| r.trim().to_string()).collect()),
            ),
            Step::Preferencia => store(&mut self.preferencia, Preference::from_input(raw)),
            Step::Dias => store(
                &mut self.dias,
                leading_int(raw).and_then(|d| u8::try_from(d).ok()),
            ),
        }
    }

    pub fn to_request(&self) -> Option<RecommendationRequest> {
        Some(RecommendationRequest {
            edad: self.edad?,
            peso: self.peso?,
            altura: self.altura?,
            restricciones: self.restricciones.clone()?,
            preferencia: self.preferencia?,
            dias: self.dias?,
        })
    }
}

fn store<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}
