//! Action plan templates
//!
//! Turns a free-text sales challenge into a dated plan by picking templates
//! whose keywords appear in the challenge and numbering their steps as
//! action items, one week apart.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sales_coach_config::constants::action_plan::{
    DAYS_PER_MONTH, DAYS_PER_WEEK, DEFAULT_TIMELINE_DAYS, HIGH_PRIORITY_STEPS, MAX_TEMPLATES,
    ONBOARDING_DUE_DAYS,
};

use crate::KnowledgeError;

const BUILTIN: &str = include_str!("../data/action_templates.yaml");

/// Category picked when no keyword matches
const FALLBACK: (&str, &str) = ("new_business", "email_campaign");
const DEFAULT_DURATION: &str = "1 week";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStep {
    pub step: u32,
    pub action: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverable: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub checklist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    /// Metrics, scenarios or techniques that go with the step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub name: String,
    pub title: String,
    pub description: String,
    pub steps: Vec<TemplateStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_required: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outcome: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_investment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateCategory {
    category: String,
    keywords: Vec<String>,
    templates: Vec<ActionTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

/// Who the plan is for
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlanContext {
    #[serde(default)]
    pub experience_years: Option<f32>,
    #[serde(default)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub duration: String,
    pub due_date: NaiveDate,
    pub deliverables: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_criteria: Option<String>,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateRef {
    pub category: String,
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionPlan {
    pub challenge: String,
    pub timeline: String,
    pub total_duration_days: u32,
    pub action_items: Vec<ActionItem>,
    pub templates_used: Vec<TemplateRef>,
    /// Expected outcome keyed by template name
    pub success_metrics: BTreeMap<String, String>,
    pub required_resources: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focus_area: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateSummary {
    pub name: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateListing {
    pub category: String,
    pub templates: Vec<TemplateSummary>,
}

/// Keyword-driven action plan builder
#[derive(Debug, Clone)]
pub struct ActionTemplateGenerator {
    categories: Vec<TemplateCategory>,
}

impl ActionTemplateGenerator {
    /// Generator over the built-in template set
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::from_yaml_str(BUILTIN)
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, KnowledgeError> {
        let categories: Vec<TemplateCategory> =
            serde_yaml::from_str(source).map_err(|e| KnowledgeError::Parse(e.to_string()))?;
        if categories.iter().all(|c| c.templates.is_empty()) {
            return Err(KnowledgeError::InvalidFormat(
                "no action templates defined".to_string(),
            ));
        }
        Ok(Self { categories })
    }

    /// Plan dated from today (UTC)
    pub fn generate(&self, challenge: &str, context: &PlanContext, timeline: &str) -> ActionPlan {
        self.generate_from(challenge, context, timeline, Utc::now().date_naive())
    }

    pub fn generate_from(
        &self,
        challenge: &str,
        context: &PlanContext,
        timeline: &str,
        today: NaiveDate,
    ) -> ActionPlan {
        let selected = self.select(challenge);

        let mut plan = ActionPlan {
            challenge: challenge.to_string(),
            timeline: timeline.to_string(),
            total_duration_days: parse_timeline(timeline),
            action_items: Vec::new(),
            templates_used: Vec::new(),
            success_metrics: BTreeMap::new(),
            required_resources: Vec::new(),
            focus_area: None,
        };
        let mut resources = BTreeSet::new();

        let mut number: i64 = 1;
        for (category, template) in selected.into_iter().take(MAX_TEMPLATES) {
            plan.templates_used.push(TemplateRef {
                category: category.to_string(),
                name: template.name.clone(),
                title: template.title.clone(),
            });

            for step in &template.steps {
                plan.action_items.push(ActionItem {
                    id: format!("action_{}", number),
                    title: step.action.clone(),
                    description: step.details.clone(),
                    priority: if step.step <= HIGH_PRIORITY_STEPS {
                        Priority::High
                    } else {
                        Priority::Medium
                    },
                    duration: step
                        .duration
                        .clone()
                        .unwrap_or_else(|| DEFAULT_DURATION.to_string()),
                    due_date: today + Duration::weeks(number),
                    deliverables: match &step.deliverable {
                        Some(deliverable) => vec![deliverable.clone()],
                        None => step.checklist.clone(),
                    },
                    success_criteria: step.success_criteria.clone(),
                    category: category.to_string(),
                    template_reference: Some(template.name.clone()),
                });
                number += 1;
            }

            resources.extend(template.tools_required.iter().cloned());
            if let Some(outcome) = &template.expected_outcome {
                plan.success_metrics
                    .insert(template.name.clone(), outcome.clone());
            }
        }

        plan.required_resources = resources.into_iter().collect();
        customize(&mut plan, context, today);

        tracing::debug!(
            templates = plan.templates_used.len(),
            items = plan.action_items.len(),
            days = plan.total_duration_days,
            "Generated action plan"
        );
        plan
    }

    /// Templates of every category named by the challenge, in catalogue order.
    /// Falls back to the email campaign when nothing matches.
    fn select(&self, challenge: &str) -> Vec<(&str, &ActionTemplate)> {
        let challenge = challenge.to_lowercase();
        let mut selected: Vec<(&str, &ActionTemplate)> = self
            .categories
            .iter()
            .filter(|c| c.keywords.iter().any(|k| challenge.contains(&k.to_lowercase())))
            .flat_map(|c| c.templates.iter().map(move |t| (c.category.as_str(), t)))
            .collect();

        if selected.is_empty() {
            if let Some(template) = self.template(FALLBACK.0, FALLBACK.1) {
                selected.push((FALLBACK.0, template));
            }
        }
        selected
    }

    pub fn template(&self, category: &str, name: &str) -> Option<&ActionTemplate> {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .and_then(|c| c.templates.iter().find(|t| t.name == name))
    }

    pub fn list_templates(&self) -> Vec<TemplateListing> {
        self.categories
            .iter()
            .map(|c| TemplateListing {
                category: c.category.clone(),
                templates: c
                    .templates
                    .iter()
                    .map(|t| TemplateSummary {
                        name: t.name.clone(),
                        title: t.title.clone(),
                        description: t.description.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

/// First-year reps get an onboarding item; the department sets the focus.
fn customize(plan: &mut ActionPlan, context: &PlanContext, today: NaiveDate) {
    if context.experience_years.unwrap_or(1.0) < 1.0 {
        plan.action_items.insert(
            0,
            ActionItem {
                id: "action_0".to_string(),
                title: "Learn the fundamentals".to_string(),
                description: "Attend the sales onboarding sessions".to_string(),
                priority: Priority::High,
                duration: DEFAULT_DURATION.to_string(),
                due_date: today + Duration::days(ONBOARDING_DUE_DAYS),
                deliverables: Vec::new(),
                success_criteria: None,
                category: "onboarding".to_string(),
                template_reference: None,
            },
        );
    }

    let department = context
        .department
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    plan.focus_area = if department.contains("new business") || department.contains("新規開拓") {
        Some("New customer acquisition".to_string())
    } else if department.contains("existing") || department.contains("既存") {
        Some("Deepening customer relationships".to_string())
    } else {
        None
    };
}

/// Days in a timeline such as "3 weeks", "2 months", "3週間" or "2ヶ月".
/// Anything unreadable counts as one month.
pub fn parse_timeline(timeline: &str) -> u32 {
    let text = timeline.trim().to_lowercase();
    let units: [(&[&str], u32); 3] = [
        (&["週間", "weeks", "week"], DAYS_PER_WEEK),
        (&["ヶ月", "か月", "カ月", "months", "month"], DAYS_PER_MONTH),
        (&["日", "days", "day"], 1),
    ];

    units
        .iter()
        .find_map(|(suffixes, days)| {
            suffixes
                .iter()
                .find_map(|suffix| text.strip_suffix(suffix))
                .and_then(|count| count.trim().parse::<u32>().ok())
                .map(|count| count * days)
        })
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_TIMELINE_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> ActionTemplateGenerator {
        ActionTemplateGenerator::builtin().unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
    }

    #[test]
    fn test_parse_timeline() {
        assert_eq!(parse_timeline("3週間"), 21);
        assert_eq!(parse_timeline("2ヶ月"), 60);
        assert_eq!(parse_timeline("1か月"), 30);
        assert_eq!(parse_timeline("2 weeks"), 14);
        assert_eq!(parse_timeline("1 Month"), 30);
        assert_eq!(parse_timeline("10 days"), 10);
        assert_eq!(parse_timeline("soon"), DEFAULT_TIMELINE_DAYS);
        assert_eq!(parse_timeline("0 weeks"), DEFAULT_TIMELINE_DAYS);
        assert_eq!(parse_timeline("a few weeks"), DEFAULT_TIMELINE_DAYS);
    }

    #[test]
    fn test_keyword_selects_category() {
        let plan = generator().generate_from(
            "My mind goes blank when I present",
            &PlanContext::default(),
            "2 weeks",
            today(),
        );
        assert_eq!(plan.templates_used.len(), 1);
        assert_eq!(plan.templates_used[0].name, "confidence_building");
        assert_eq!(plan.total_duration_days, 14);
        assert_eq!(plan.action_items.len(), 3);
        assert!(plan.required_resources.is_empty());
        assert!(plan.success_metrics.is_empty());
    }

    #[test]
    fn test_items_are_numbered_weekly() {
        let plan = generator().generate_from(
            "Struggling to win new customers",
            &PlanContext::default(),
            "1 month",
            today(),
        );
        let names: Vec<_> = plan.templates_used.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["email_campaign", "social_selling"]);
        assert_eq!(plan.action_items.len(), 7);

        for (i, item) in plan.action_items.iter().enumerate() {
            let n = i as i64 + 1;
            assert_eq!(item.id, format!("action_{}", n));
            assert_eq!(item.due_date, today() + Duration::weeks(n));
        }

        let first = &plan.action_items[0];
        assert_eq!(first.priority, Priority::High);
        assert_eq!(first.deliverables.len(), 1);
        assert_eq!(first.template_reference.as_deref(), Some("email_campaign"));
        assert_eq!(plan.action_items[2].priority, Priority::Medium);

        // social_selling step 1 has a checklist instead of a deliverable
        assert_eq!(plan.action_items[4].priority, Priority::High);
        assert_eq!(plan.action_items[4].deliverables.len(), 4);

        assert_eq!(
            plan.required_resources,
            ["CRM", "Company database", "Email delivery tool"]
        );
        assert!(plan.success_metrics.contains_key("email_campaign"));
    }

    #[test]
    fn test_at_most_two_templates() {
        let plan = generator().generate_from(
            "Build trust and give a better presentation",
            &PlanContext::default(),
            "1 month",
            today(),
        );
        let names: Vec<_> = plan.templates_used.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["presentation_mastery", "trust_acceleration"]);

        let plan = generator().generate_from(
            "New customer presentation nerves: I get nervous",
            &PlanContext::default(),
            "1 month",
            today(),
        );
        assert_eq!(plan.templates_used.len(), MAX_TEMPLATES);
    }

    #[test]
    fn test_fallback_template() {
        let plan = generator().generate_from(
            "Everything is hard",
            &PlanContext::default(),
            "soon",
            today(),
        );
        assert_eq!(plan.templates_used.len(), 1);
        assert_eq!(plan.templates_used[0].name, "email_campaign");
        assert_eq!(plan.total_duration_days, 30);
    }

    #[test]
    fn test_context_customization() {
        let context = PlanContext {
            experience_years: Some(0.5),
            department: Some("New Business Sales".to_string()),
        };
        let plan = generator().generate_from("build trust", &context, "1 month", today());

        let onboarding = &plan.action_items[0];
        assert_eq!(onboarding.id, "action_0");
        assert_eq!(onboarding.due_date, today() + Duration::days(3));
        assert_eq!(onboarding.template_reference, None);
        assert_eq!(plan.action_items[1].id, "action_1");
        assert_eq!(plan.focus_area.as_deref(), Some("New customer acquisition"));

        let veteran = PlanContext {
            experience_years: Some(4.0),
            department: Some("Existing accounts".to_string()),
        };
        let plan = generator().generate_from("build trust", &veteran, "1 month", today());
        assert_eq!(plan.action_items[0].id, "action_1");
        assert_eq!(
            plan.focus_area.as_deref(),
            Some("Deepening customer relationships")
        );

        let plan =
            generator().generate_from("build trust", &PlanContext::default(), "1 month", today());
        assert_eq!(plan.action_items[0].id, "action_1");
        assert_eq!(plan.focus_area, None);
    }

    #[test]
    fn test_list_and_lookup_templates() {
        let generator = generator();
        let listing = generator.list_templates();
        let categories: Vec<_> = listing.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(
            categories,
            ["new_business", "presentation", "nerves", "relationships"]
        );
        assert_eq!(listing[0].templates.len(), 2);

        let template = generator.template("presentation", "presentation_mastery").unwrap();
        assert_eq!(template.steps.len(), 4);
        assert!(template.steps[1].notes.len() >= 4);
        assert!(generator.template("presentation", "email_campaign").is_none());
    }

    #[test]
    fn test_rejects_empty_catalogue() {
        assert!(matches!(
            ActionTemplateGenerator::from_yaml_str("- category: x\n  keywords: []\n  templates: []\n"),
            Err(KnowledgeError::InvalidFormat(_))
        ));
        assert!(matches!(
            ActionTemplateGenerator::from_yaml_str("not: [a list"),
            Err(KnowledgeError::Parse(_))
        ));
    }
}
