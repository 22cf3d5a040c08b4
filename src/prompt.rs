//! Renders a generation request into the instructions sent to a provider.

use crate::types::{GenerationRequest, PlanKind, PlanTargets};

const TRAINING_OUTPUT_INSTRUCTIONS: &str = r#"Respond with a JSON object of the following structure:
{
  "weeks": [
    {
      "week": 1,
      "sessions": [
        {
          "day": "Monday",
          "focus": "main focus of the session",
          "exercises": [
            {"name": "exercise name", "sets": 3, "reps": "8-12", "rest_seconds": 90}
          ]
        }
      ]
    }
  ]
}

Include one entry per week and one session entry per training day.
Write all names and descriptions in plain English.
Only respond with valid JSON, with no text before or after it."#;

const NUTRITION_OUTPUT_INSTRUCTIONS: &str = r#"Respond with a JSON object of the following structure:
{
  "days": [
    {
      "day": 1,
      "meals": [
        {
          "name": "meal name",
          "time": "08:00",
          "calories": 450,
          "protein_g": 30,
          "carbs_g": 45,
          "fat_g": 15
        }
      ],
      "total_calories": 2000
    }
  ]
}

Include one entry per day covering the full duration.
Write all names and descriptions in plain English.
Only respond with valid JSON, with no text before or after it."#;

/// Build the full prompt for `request`. Pure; no I/O.
///
/// Optional context sections are appended only when the corresponding data
/// is present. The fixed closing block pins the expected output schema.
pub fn build_prompt(request: &GenerationRequest) -> String {
    let mut prompt = match &request.targets {
        PlanTargets::Training {
            duration_weeks,
            sessions_per_week,
            difficulty,
            focus,
        } => {
            let mut text = format!(
                "Create a {}-week training plan named \"{}\" with {} sessions per week at {} difficulty.",
                duration_weeks, request.plan_name, sessions_per_week, difficulty
            );
            if let Some(focus) = focus {
                text.push_str(&format!(" The plan should focus on {}.", focus));
            }
            text
        }
        PlanTargets::Nutrition {
            duration_days,
            daily_calories,
            protein_pct,
            carbs_pct,
            fat_pct,
            restrictions,
        } => {
            let mut text = format!(
                "Create a {}-day nutrition plan named \"{}\" targeting {} kcal per day with a macro split of {}% protein, {}% carbohydrates and {}% fat.",
                duration_days, request.plan_name, daily_calories, protein_pct, carbs_pct, fat_pct
            );
            if !restrictions.is_empty() {
                text.push_str(&format!(
                    " Dietary restrictions: {}.",
                    restrictions.join(", ")
                ));
            }
            text
        }
    };

    if let Some(metrics) = &request.context.body_metrics {
        prompt.push_str(&format!(
            "\n\nUser body data (recorded {}): weight {:.1} kg, height {:.1} cm",
            metrics.recorded_at, metrics.weight_kg, metrics.height_cm
        ));
        if let Some(body_fat) = metrics.body_fat_pct {
            prompt.push_str(&format!(", body fat {:.1}%", body_fat));
        }
        prompt.push('.');
    }

    if !request.context.goals.is_empty() {
        prompt.push_str("\n\nActive goals:");
        for goal in &request.context.goals {
            match &goal.target_date {
                Some(date) => {
                    prompt.push_str(&format!("\n- {} (target date {})", goal.description, date))
                }
                None => prompt.push_str(&format!("\n- {}", goal.description)),
            }
        }
    }

    if let Some(assessment) = &request.context.assessment {
        prompt.push_str(&format!("\n\nLatest fitness assessment:\n{}", assessment));
    }

    prompt.push_str("\n\n");
    prompt.push_str(match request.kind() {
        PlanKind::Training => TRAINING_OUTPUT_INSTRUCTIONS,
        PlanKind::Nutrition => NUTRITION_OUTPUT_INSTRUCTIONS,
    });
    prompt
}
