use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::numeric::leading_int;
use super::plan::{MealSlot, RecommendationPlan};

/// Minutes represented by a preparation-time descriptor: `">60"` counts as 90,
/// a `"min-max"` range as its mean, anything else as its leading integer or 0.
pub fn prep_minutes(descriptor: &str) -> f64 {
    if descriptor.contains(">60") {
        return 90.0;
    }
    if let Some((low, high)) = descriptor.split_once('-') {
        return match (leading_int(low), leading_int(high)) {
            (Some(low), Some(high)) => (low + high) as f64 / 2.0,
            _ => 0.0,
        };
    }
    leading_int(descriptor).map_or(0.0, |m| m as f64)
}

pub fn calories(text: &str) -> i64 {
    leading_int(text).unwrap_or(0)
}

/// Which meal slots an aggregate looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum SlotFilter {
    #[default]
    All,
    Only(MealSlot),
}

impl SlotFilter {
    fn includes(self, slot: MealSlot) -> bool {
        match self {
            SlotFilter::All => true,
            SlotFilter::Only(only) => only == slot,
        }
    }
}

impl FromStr for SlotFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SlotFilter::All);
        }
        MealSlot::from_name(s)
            .map(SlotFilter::Only)
            .ok_or_else(|| format!("unknown meal slot: {s}"))
    }
}

impl TryFrom<String> for SlotFilter {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SlotAverages {
    #[serde(rename = "Desayuno")]
    pub desayuno: f64,
    #[serde(rename = "Almuerzo")]
    pub almuerzo: f64,
    #[serde(rename = "Merienda")]
    pub merienda: f64,
}

impl SlotAverages {
    pub fn get(&self, slot: MealSlot) -> f64 {
        match slot {
            MealSlot::Desayuno => self.desayuno,
            MealSlot::Almuerzo => self.almuerzo,
            MealSlot::Merienda => self.merienda,
        }
    }

    fn set(&mut self, slot: MealSlot, value: f64) {
        match slot {
            MealSlot::Desayuno => self.desayuno = value,
            MealSlot::Almuerzo => self.almuerzo = value,
            MealSlot::Merienda => self.merienda = value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCalories {
    pub day: String,
    pub ordinal: u32,
    pub calories: i64,
}

/// Dashboard numbers derived from a plan. Totals honour the slot filter;
/// per-slot averages and per-day totals always cover every slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub distinct_ingredients: usize,
    pub total_calories: i64,
    pub total_minutes: f64,
    pub average_calories: SlotAverages,
    pub average_minutes: SlotAverages,
    pub calories_by_day: Vec<DayCalories>,
}

pub fn aggregate(plan: &RecommendationPlan, filter: SlotFilter) -> Aggregates {
    let mut ingredients = HashSet::new();
    let mut total_calories = 0;
    let mut total_minutes = 0.0;

    for day in plan.days() {
        for (_, recipe) in day.meals.iter().filter(|(slot, _)| filter.includes(*slot)) {
            total_calories += calories(&recipe.calories);
            total_minutes += prep_minutes(&recipe.prep_time);
            ingredients.extend(ingredient_tokens(&recipe.ingredients));
        }
    }

    let mut average_calories = SlotAverages::default();
    let mut average_minutes = SlotAverages::default();
    for slot in MealSlot::ALL {
        let present: Vec<_> = plan.days().iter().filter_map(|d| d.meals.get(slot)).collect();
        if present.is_empty() {
            continue;
        }
        let n = present.len() as f64;
        let cal: i64 = present.iter().map(|r| calories(&r.calories)).sum();
        let min: f64 = present.iter().map(|r| prep_minutes(&r.prep_time)).sum();
        average_calories.set(slot, cal as f64 / n);
        average_minutes.set(slot, min / n);
    }

    let mut calories_by_day: Vec<DayCalories> = plan
        .days()
        .iter()
        .map(|d| DayCalories {
            day: d.label.clone(),
            ordinal: d.ordinal,
            calories: d.meals.iter().map(|(_, r)| calories(&r.calories)).sum(),
        })
        .collect();
    calories_by_day.sort_by_key(|d| d.ordinal);

    Aggregates {
        distinct_ingredients: ingredients.len(),
        total_calories,
        total_minutes,
        average_calories,
        average_minutes,
        calories_by_day,
    }
}

fn ingredient_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| t.chars().count() > 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meal(calories: &str, time: &str, ingredients: &str) -> serde_json::Value {
        json!({
            "Nombre del Plato": "x",
            "Ingredientes": ingredients,
            "Calorías": calories,
            "Tiempo de Preparación": time,
            "Procedimiento": "y"
        })
    }

    #[test]
    fn prep_minutes_normalizes_descriptors() {
        assert_eq!(prep_minutes("45"), 45.0);
        assert_eq!(prep_minutes("30-50"), 40.0);
        assert_eq!(prep_minutes("15-20"), 17.5);
        assert_eq!(prep_minutes(">60 min"), 90.0);
        assert_eq!(prep_minutes(""), 0.0);
        assert_eq!(prep_minutes("rápido"), 0.0);
        assert_eq!(prep_minutes("a-b"), 0.0);
    }

    #[test]
    fn averages_only_over_days_with_the_slot() {
        let plan: RecommendationPlan = serde_json::from_value(json!({
            "Día 1": { "Desayuno": meal("300", "10", "leche") },
            "Día 2": { "Desayuno": meal("400", "20", "leche") }
        }))
        .unwrap();

        let agg = aggregate(&plan, SlotFilter::All);
        assert_eq!(agg.average_calories.get(MealSlot::Desayuno), 350.0);
        assert_eq!(agg.average_calories.get(MealSlot::Almuerzo), 0.0);
        assert_eq!(agg.average_calories.get(MealSlot::Merienda), 0.0);
        assert_eq!(agg.average_minutes.get(MealSlot::Desayuno), 15.0);
        assert_eq!(agg.total_calories, 700);
        assert_eq!(agg.total_minutes, 30.0);
    }

    #[test]
    fn filter_limits_totals_and_ingredients() {
        let plan: RecommendationPlan = serde_json::from_value(json!({
            "Día 1": {
                "Desayuno": meal("300", "10", "Leche de avena"),
                "Almuerzo": meal("600 kcal", ">60", "Arroz pollo de campo")
            }
        }))
        .unwrap();

        let all = aggregate(&plan, SlotFilter::All);
        // "de" is dropped, "leche", "avena", "arroz", "pollo", "campo" remain
        assert_eq!(all.distinct_ingredients, 5);
        assert_eq!(all.total_calories, 900);
        assert_eq!(all.total_minutes, 100.0);

        let lunch = aggregate(&plan, SlotFilter::Only(MealSlot::Almuerzo));
        assert_eq!(lunch.distinct_ingredients, 3);
        assert_eq!(lunch.total_calories, 600);
        assert_eq!(lunch.total_minutes, 90.0);
        assert_eq!(lunch.average_calories.get(MealSlot::Desayuno), 300.0);
    }

    #[test]
    fn per_day_calories_sorted_numerically() {
        let plan: RecommendationPlan = serde_json::from_value(json!({
            "Día 3": { "Merienda": meal("100", "5", "") },
            "Día 1": { "Desayuno": meal("200", "5", ""), "Merienda": meal("abc", "5", "") },
            "Día 2": {}
        }))
        .unwrap();

        let days = aggregate(&plan, SlotFilter::All).calories_by_day;
        let summary: Vec<_> = days.iter().map(|d| (d.ordinal, d.calories)).collect();
        assert_eq!(summary, vec![(1, 200), (2, 0), (3, 100)]);
    }

    #[test]
    fn slot_filter_parses_query_values() {
        assert_eq!("all".parse::<SlotFilter>(), Ok(SlotFilter::All));
        assert_eq!(
            "Almuerzo".parse::<SlotFilter>(),
            Ok(SlotFilter::Only(MealSlot::Almuerzo))
        );
        assert!("cena".parse::<SlotFilter>().is_err());
    }
}
