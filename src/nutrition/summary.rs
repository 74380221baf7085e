use super::answers::RecommendationRequest;
use super::plan::{MealSlot, Recipe, RecommendationPlan};

/// Human readable multi-day plan. Absent slots are skipped; slots inside a
/// day are separated by a blank line and days by two.
pub fn format_plan(plan: &RecommendationPlan) -> String {
    plan.days()
        .iter()
        .map(|day| {
            let meals = day
                .meals
                .iter()
                .map(|(slot, recipe)| meal_block(slot, recipe))
                .collect::<Vec<_>>()
                .join("\n");
            format!("{}:\n{}", day.label, meals)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn meal_block(slot: MealSlot, recipe: &Recipe) -> String {
    format!(
        "{}:\n- Plato: {}\n- Ingredientes: {}\n- Calorías: {}\n- Tiempo: {}\n- Procedimiento: {}\n",
        slot.as_str(),
        recipe.name,
        recipe.ingredients,
        recipe.calories,
        recipe.prep_time,
        recipe.procedure,
    )
}

/// Recap of the answers the plan was computed from.
pub fn answers_summary(request: &RecommendationRequest) -> String {
    format!(
        "Resumen de datos:\nPeso: {} kg\nAltura: {} cm\nEdad: {} años\nRestricciones: {}\nPreferencia: {}\nDías: {}",
        request.peso,
        request.altura,
        request.edad,
        request.restricciones.join(", "),
        request.preferencia.as_str(),
        request.dias,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::answers::Preference;
    use serde_json::json;

    fn recipe(name: &str) -> serde_json::Value {
        json!({
            "Nombre del Plato": name,
            "Ingredientes": "a b",
            "Calorías": "100",
            "Tiempo de Preparación": "15",
            "Procedimiento": "Mezclar."
        })
    }

    #[test]
    fn formats_days_and_skips_missing_slots() {
        let plan: RecommendationPlan = serde_json::from_value(json!({
            "Día 1": { "Desayuno": recipe("Batido"), "Merienda": recipe("Flan") },
            "Día 2": { "Almuerzo": recipe("Sopa") }
        }))
        .unwrap();

        let text = format_plan(&plan);
        let expected = "Día 1:\n\
Desayuno:\n- Plato: Batido\n- Ingredientes: a b\n- Calorías: 100\n- Tiempo: 15\n- Procedimiento: Mezclar.\n\
\n\
Merienda:\n- Plato: Flan\n- Ingredientes: a b\n- Calorías: 100\n- Tiempo: 15\n- Procedimiento: Mezclar.\n\
\n\n\
Día 2:\n\
Almuerzo:\n- Plato: Sopa\n- Ingredientes: a b\n- Calorías: 100\n- Tiempo: 15\n- Procedimiento: Mezclar.\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn empty_plan_formats_to_empty_text() {
        assert_eq!(format_plan(&RecommendationPlan::default()), "");
    }

    #[test]
    fn summarizes_answers() {
        let request = RecommendationRequest {
            edad: 30,
            peso: 70.0,
            altura: 175.5,
            restricciones: vec!["Sin gluten".into(), "Keto".into()],
            preferencia: Preference::Dulce,
            dias: 2,
        };
        assert_eq!(
            answers_summary(&request),
            "Resumen de datos:\nPeso: 70 kg\nAltura: 175.5 cm\nEdad: 30 años\nRestricciones: Sin gluten, Keto\nPreferencia: dulce\nDías: 2"
        );
    }
}
