use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::plan::{MealSlot, Recipe, RecommendationPlan};

lazy_static! {
    // headers only count when they stand alone on their line
    static ref DAY_MARKER: Regex = Regex::new(r"(?m)^[ \t]*(Día \d+):[ \t]*$").unwrap();
    static ref SLOT_MARKER: Regex =
        Regex::new(r"(?m)^[ \t]*(Desayuno|Almuerzo|Merienda):[ \t]*$").unwrap();
}

pub const HEADERS: [&str; 7] = [
    "Día",
    "Comida",
    "Plato",
    "Ingredientes",
    "Calorías",
    "Tiempo",
    "Procedimiento",
];

/// One line of the exported table: a single meal of a single day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub day: String,
    pub meal: String,
    pub dish: String,
    pub ingredients: String,
    pub calories: String,
    pub time: String,
    pub procedure: String,
}

impl ExportRow {
    fn has_content(&self) -> bool {
        [
            &self.dish,
            &self.ingredients,
            &self.calories,
            &self.time,
            &self.procedure,
        ]
        .iter()
        .any(|f| !f.is_empty())
    }
}

pub fn rows_from_plan(plan: &RecommendationPlan) -> Vec<ExportRow> {
    plan.days()
        .iter()
        .flat_map(|day| {
            day.meals
                .iter()
                .map(move |(slot, recipe)| row_from_recipe(&day.label, slot, recipe))
        })
        .filter(ExportRow::has_content)
        .collect()
}

fn row_from_recipe(day: &str, slot: MealSlot, recipe: &Recipe) -> ExportRow {
    ExportRow {
        day: day.to_string(),
        meal: slot.as_str().to_string(),
        dish: recipe.name.trim().to_string(),
        ingredients: recipe.ingredients.trim().to_string(),
        calories: recipe.calories.trim().to_string(),
        time: recipe.prep_time.trim().to_string(),
        procedure: recipe.procedure.trim().to_string(),
    }
}

/// Rebuilds table rows from a formatted plan text. Sections that yield no
/// field are dropped rather than reported.
pub fn rows_from_summary(text: &str) -> Vec<ExportRow> {
    let markers: Vec<_> = DAY_MARKER.captures_iter(text).collect();
    let mut rows = Vec::new();
    for (i, caps) in markers.iter().enumerate() {
        let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let block = &text[whole.end()..end];
        for (slot, section) in slot_sections(block) {
            let row = parse_section(label.as_str(), slot, section);
            if row.has_content() {
                rows.push(row);
            }
        }
    }
    rows
}

fn slot_sections(block: &str) -> Vec<(MealSlot, &str)> {
    let found: Vec<(usize, usize, MealSlot)> = SLOT_MARKER
        .captures_iter(block)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let slot = MealSlot::from_name(caps.get(1)?.as_str())?;
            Some((whole.start(), whole.end(), slot))
        })
        .collect();

    found
        .iter()
        .enumerate()
        .map(|(i, (_, body_start, slot))| {
            let end = found.get(i + 1).map_or(block.len(), |(next, _, _)| *next);
            (*slot, &block[*body_start..end])
        })
        .collect()
}

#[derive(Clone, Copy)]
enum Field {
    Dish,
    Ingredients,
    Calories,
    Time,
    Procedure,
}

impl Field {
    fn from_key(key: &str) -> Option<Field> {
        match key.trim() {
            "Plato" => Some(Field::Dish),
            "Ingredientes" => Some(Field::Ingredients),
            "Calorías" => Some(Field::Calories),
            "Tiempo" => Some(Field::Time),
            "Procedimiento" => Some(Field::Procedure),
            _ => None,
        }
    }

    fn slot(self, row: &mut ExportRow) -> &mut String {
        match self {
            Field::Dish => &mut row.dish,
            Field::Ingredients => &mut row.ingredients,
            Field::Calories => &mut row.calories,
            Field::Time => &mut row.time,
            Field::Procedure => &mut row.procedure,
        }
    }
}

fn parse_section(day: &str, slot: MealSlot, section: &str) -> ExportRow {
    let mut row = ExportRow {
        day: day.to_string(),
        meal: slot.as_str().to_string(),
        ..ExportRow::default()
    };
    let mut current: Option<Field> = None;

    for line in section.lines() {
        let keyed = line
            .trim_start()
            .strip_prefix('-')
            .and_then(|rest| rest.split_once(':'))
            .and_then(|(key, value)| Field::from_key(key).map(|f| (f, value)));
        match keyed {
            Some((field, value)) => {
                *field.slot(&mut row) = value.to_string();
                current = Some(field);
            }
            // anything else, blank lines included, continues the open field
            None => {
                if let Some(field) = current {
                    let target = field.slot(&mut row);
                    target.push('\n');
                    target.push_str(line);
                }
            }
        }
    }

    for field in [
        &mut row.dish,
        &mut row.ingredients,
        &mut row.calories,
        &mut row.time,
        &mut row.procedure,
    ] {
        *field = field.trim().to_string();
    }
    row
}

/// Renders rows as CSV with the Spanish column headers.
pub fn to_csv(rows: &[ExportRow]) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADERS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flush csv export: {}", e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::summary::format_plan;
    use serde_json::json;

    fn sample_plan() -> RecommendationPlan {
        serde_json::from_value(json!({
            "Día 1": {
                "Desayuno": {
                    "Nombre del Plato": "Batido de avena",
                    "Ingredientes": "avena, leche, banana",
                    "Calorías": "320",
                    "Tiempo de Preparación": "10",
                    "Procedimiento": "Licuar todo.\nServir frío."
                },
                "Merienda": {
                    "Nombre del Plato": "Flan",
                    "Ingredientes": "huevos leche azúcar",
                    "Calorías": 280,
                    "Tiempo de Preparación": ">60",
                    "Procedimiento": "Paso 1: batir. Paso 2: hornear."
                }
            },
            "Día 2": {
                "Almuerzo": {
                    "Nombre del Plato": "Sopa",
                    "Ingredientes": "zanahoria papa",
                    "Calorías": "410",
                    "Tiempo de Preparación": "30-50",
                    "Procedimiento": "Hervir."
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn plan_rows_follow_day_and_slot_order() {
        let rows = rows_from_plan(&sample_plan());
        let keys: Vec<_> = rows.iter().map(|r| (r.day.as_str(), r.meal.as_str())).collect();
        assert_eq!(
            keys,
            vec![("Día 1", "Desayuno"), ("Día 1", "Merienda"), ("Día 2", "Almuerzo")]
        );
        assert_eq!(rows[1].calories, "280");
        assert_eq!(rows[2].time, "30-50");
    }

    #[test]
    fn summary_text_yields_same_rows_as_plan() {
        let plan = sample_plan();
        let text = format_plan(&plan);
        assert_eq!(rows_from_summary(&text), rows_from_plan(&plan));
    }

    #[test]
    fn flattening_is_idempotent() {
        let text = format_plan(&sample_plan());
        assert_eq!(rows_from_summary(&text), rows_from_summary(&text));
    }

    #[test]
    fn sections_without_fields_are_dropped() {
        let text = "Día 1:\nDesayuno:\nnada que ver\n\nAlmuerzo:\n- Plato: Sopa\n";
        let rows = rows_from_summary(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].meal, "Almuerzo");
        assert_eq!(rows[0].dish, "Sopa");
        assert!(rows_from_summary("texto sin marcadores").is_empty());
    }

    #[test]
    fn header_words_inside_values_survive_the_text_path() {
        let plan: RecommendationPlan = serde_json::from_value(json!({
            "Día 1": {
                "Almuerzo": {
                    "Nombre del Plato": "Lentejas",
                    "Ingredientes": "lentejas cebolla",
                    "Calorías": "450",
                    "Tiempo de Preparación": "40",
                    "Procedimiento": "Remojar.\n\nCocinar. Guardar para la Merienda: servir frío.\nRepetir el Día 2: igual."
                },
                "Merienda": {
                    "Nombre del Plato": "Desayuno: tostada tardía",
                    "Ingredientes": "pan",
                    "Calorías": "150",
                    "Tiempo de Preparación": "5",
                    "Procedimiento": "  Tostar.\n    Servir."
                }
            },
            "2": {
                "Desayuno": {
                    "Nombre del Plato": "Avena",
                    "Ingredientes": "avena leche",
                    "Calorías": "280",
                    "Tiempo de Preparación": "10",
                    "Procedimiento": "Hervir."
                }
            }
        }))
        .unwrap();

        let from_plan = rows_from_plan(&plan);
        assert_eq!(from_plan.len(), 3);
        assert_eq!(rows_from_summary(&format_plan(&plan)), from_plan);
        assert_eq!(
            from_plan[0].procedure,
            "Remojar.\n\nCocinar. Guardar para la Merienda: servir frío.\nRepetir el Día 2: igual."
        );
        assert_eq!(from_plan[2].day, "Día 2");
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let rows = rows_from_plan(&sample_plan());
        let bytes = to_csv(&rows).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let first = text.lines().next().unwrap();
        assert_eq!(
            first,
            "Día,Comida,Plato,Ingredientes,Calorías,Tiempo,Procedimiento"
        );
        assert!(text.contains("\"avena, leche, banana\""));

        let empty = String::from_utf8(to_csv(&[]).unwrap()).unwrap();
        assert_eq!(empty.lines().count(), 1);
    }
}
