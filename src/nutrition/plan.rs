use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Daily meal categories, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MealSlot {
    Desayuno,
    Almuerzo,
    Merienda,
}

impl MealSlot {
    pub const ALL: [MealSlot; 3] = [MealSlot::Desayuno, MealSlot::Almuerzo, MealSlot::Merienda];

    pub fn as_str(self) -> &'static str {
        match self {
            MealSlot::Desayuno => "Desayuno",
            MealSlot::Almuerzo => "Almuerzo",
            MealSlot::Merienda => "Merienda",
        }
    }

    pub fn from_name(name: &str) -> Option<MealSlot> {
        MealSlot::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("day label without ordinal: {0:?}")]
    DayLabel(String),
    #[error("day {0} appears more than once")]
    DuplicateDay(u32),
}

/// One recommended dish as the recommendation service returns it.
/// Numeric fields are kept as text; the service sends them either way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(rename = "Nombre del Plato", default, deserialize_with = "text_or_number")]
    pub name: String,
    #[serde(rename = "Ingredientes", default, deserialize_with = "text_or_number")]
    pub ingredients: String,
    #[serde(rename = "Restricciones", default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
    #[serde(rename = "Calorías", default, deserialize_with = "text_or_number")]
    pub calories: String,
    #[serde(
        rename = "Tiempo de Preparación",
        default,
        deserialize_with = "text_or_number"
    )]
    pub prep_time: String,
    #[serde(rename = "Procedimiento", default, deserialize_with = "text_or_number")]
    pub procedure: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayMeals {
    #[serde(rename = "Desayuno", default, skip_serializing_if = "Option::is_none")]
    pub desayuno: Option<Recipe>,
    #[serde(rename = "Almuerzo", default, skip_serializing_if = "Option::is_none")]
    pub almuerzo: Option<Recipe>,
    #[serde(rename = "Merienda", default, skip_serializing_if = "Option::is_none")]
    pub merienda: Option<Recipe>,
}

impl DayMeals {
    pub fn get(&self, slot: MealSlot) -> Option<&Recipe> {
        match slot {
            MealSlot::Desayuno => self.desayuno.as_ref(),
            MealSlot::Almuerzo => self.almuerzo.as_ref(),
            MealSlot::Merienda => self.merienda.as_ref(),
        }
    }

    /// Present meals in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (MealSlot, &Recipe)> + '_ {
        MealSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).map(|r| (slot, r)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayPlan {
    pub label: String,
    pub ordinal: u32,
    pub meals: DayMeals,
}

/// Multi-day plan keyed on the wire by `"Día N"`. Days are held sorted by
/// their ordinal, whatever order the service used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, DayMeals>",
    into = "BTreeMap<String, DayMeals>"
)]
pub struct RecommendationPlan {
    days: Vec<DayPlan>,
}

impl RecommendationPlan {
    pub fn days(&self) -> &[DayPlan] {
        &self.days
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

impl TryFrom<BTreeMap<String, DayMeals>> for RecommendationPlan {
    type Error = PlanError;

    fn try_from(raw: BTreeMap<String, DayMeals>) -> Result<Self, Self::Error> {
        let mut days = raw
            .into_iter()
            .map(|(label, meals)| match day_ordinal(&label) {
                // labels are rewritten as "Día N" so the plan text keeps its day markers
                Some(ordinal) => Ok(DayPlan {
                    label: day_label(ordinal),
                    ordinal,
                    meals,
                }),
                None => Err(PlanError::DayLabel(label)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        days.sort_by_key(|d| d.ordinal);
        if let Some(pair) = days.windows(2).find(|w| w[0].ordinal == w[1].ordinal) {
            return Err(PlanError::DuplicateDay(pair[0].ordinal));
        }
        Ok(Self { days })
    }
}

impl From<RecommendationPlan> for BTreeMap<String, DayMeals> {
    fn from(plan: RecommendationPlan) -> Self {
        plan.days.into_iter().map(|d| (d.label, d.meals)).collect()
    }
}

pub fn day_label(ordinal: u32) -> String {
    format!("Día {}", ordinal)
}

/// `"Día 3"` → 3. Bare numbers are accepted too.
pub fn day_ordinal(label: &str) -> Option<u32> {
    let label = label.trim();
    let rest = label.strip_prefix("Día").unwrap_or(label);
    rest.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.as_f64().map_or_else(|| n.to_string(), |f| f.to_string()),
        },
        other => other.to_string(),
    })
}
