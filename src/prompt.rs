//! Composite prompt sent to the suggestion endpoint

use crate::goals::GoalRecord;

/// Summary followed by the profile's three goal sections, one goal per line
pub fn build_suggestion_prompt(summary: &str, goals: &GoalRecord) -> String {
    format!(
        "\nResumé:\n{}\n\nKompetencemål:\n{}\n\nVidensmål:\n{}\n\nFærdighedsmål:\n{}\n",
        summary,
        goals.competence_goals.joined(),
        goals.knowledge_goals.join("\n"),
        goals.skill_goals.join("\n"),
    )
}
