//! Goal formatter for display
//! Splits competence goals of the form "<title> De studerende ..." into a heading and body

use crate::goals::GoalRecord;
use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;

/// Title fragment (no capital D), whitespace, then the "De studerende" phrase onward
static TITLED_GOAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^([^D]*)\s+(De studerende.*)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedGoal {
    pub heading: Option<String>,
    pub body: String,
}

/// Display-ready view of a goal record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattedGoals {
    pub competence: Vec<FormattedGoal>,
    pub knowledge: Vec<String>,
    pub skills: Vec<String>,
}

/// Split one competence-goal entry
pub fn format_competence_goal(text: &str) -> FormattedGoal {
    if let Some(caps) = TITLED_GOAL.captures(text) {
        let heading = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
        let body = caps.get(2).map(|m| m.as_str()).unwrap_or(text);
        return FormattedGoal {
            heading: (!heading.is_empty()).then(|| heading.to_string()),
            body: body.to_string(),
        };
    }
    FormattedGoal {
        heading: None,
        body: text.to_string(),
    }
}

pub fn format_goals(record: &GoalRecord) -> FormattedGoals {
    FormattedGoals {
        competence: record
            .competence_goals
            .entries()
            .into_iter()
            .filter(|e| !e.is_empty())
            .map(format_competence_goal)
            .collect(),
        knowledge: record.knowledge_goals.clone(),
        skills: record.skill_goals.clone(),
    }
}

impl FormattedGoals {
    /// Markdown rendering with the three goal sections
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str("## Kompetencemål\n\n");
        for goal in &self.competence {
            if let Some(heading) = &goal.heading {
                let _ = writeln!(out, "**{}**", heading);
            }
            let _ = writeln!(out, "{}\n", goal.body);
        }

        out.push_str("## Vidensmål\n\n");
        for item in &self.knowledge {
            let _ = writeln!(out, "- {}", item);
        }

        out.push_str("\n## Færdighedsmål\n\n");
        for item in &self.skills {
            let _ = writeln!(out, "- {}", item);
        }
        out
    }
}
