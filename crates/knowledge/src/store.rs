//! In-memory knowledge store
//!
//! The knowledge base is a JSON tree whose top-level keys are categories.
//! A category is either a mapping of named entries or a plain list.
//! Search is substring based and scored by the share of query words found.

use std::cmp::Ordering;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};

use sales_coach_config::constants::knowledge::SEARCH_LIMIT;

use crate::KnowledgeError;

const BUILTIN: &str = include_str!("../data/knowledge.yaml");

/// Well-known category names
pub mod categories {
    pub const COMPANY_INFO: &str = "company_info";
    pub const SALES_BEST_PRACTICES: &str = "sales_best_practices";
    pub const SENIOR_EXAMPLES: &str = "senior_examples";
    pub const COMMON_CHALLENGES: &str = "common_challenges";
    pub const TOOLS_AND_RESOURCES: &str = "tools_and_resources";
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeEntry {
    pub category: String,
    /// Entry key within the category; `None` for list items
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<String>,
    pub content: Value,
    /// Fraction of query words present in the entry, 0.0..=1.0
    pub relevance_score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactMatch,
    PartialMatch,
}

/// Playbook found for a challenge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeMatch {
    /// Challenge key as stored in the knowledge base
    pub challenge: String,
    pub solution: Value,
    pub match_type: MatchType,
}

impl ChallengeMatch {
    /// First actionable line of the playbook
    pub fn headline(&self) -> Option<String> {
        match &self.solution {
            Value::Object(map) => ["solutions", "practical_tips", "mindset_shift"]
                .iter()
                .filter_map(|key| map.get(*key))
                .find_map(first_text),
            other => first_text(other),
        }
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| !s.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Best-practice bundle for a topic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestPractice {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement: Option<String>,
    pub practices: Value,
    /// Category the practices came from
    pub source: String,
}

/// Thread-safe knowledge tree
#[derive(Debug)]
pub struct KnowledgeStore {
    tree: RwLock<Map<String, Value>>,
}

impl KnowledgeStore {
    /// Store seeded with the built-in knowledge document
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::from_yaml_str(BUILTIN)
    }

    pub fn empty() -> Self {
        Self {
            tree: RwLock::new(Map::new()),
        }
    }

    pub fn from_yaml_str(source: &str) -> Result<Self, KnowledgeError> {
        let value: Value =
            serde_yaml::from_str(source).map_err(|e| KnowledgeError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, KnowledgeError> {
        match value {
            Value::Object(tree) => Ok(Self {
                tree: RwLock::new(tree),
            }),
            _ => Err(KnowledgeError::InvalidFormat(
                "top level must be a mapping of categories".to_string(),
            )),
        }
    }

    /// Merge categories into the tree, returning the number of entries merged.
    ///
    /// Mapping categories are merged key by key; anything else replaces the
    /// existing category.
    pub fn merge(&self, incoming: Map<String, Value>) -> usize {
        let mut tree = self.tree.write();
        let mut merged = 0;

        for (category, value) in incoming {
            merged += match &value {
                Value::Object(map) => map.len(),
                Value::Array(items) => items.len(),
                _ => 1,
            };
            let slot = tree.entry(category).or_insert(Value::Null);
            match (slot, value) {
                (Value::Object(existing), Value::Object(entries)) => existing.extend(entries),
                (slot, value) => *slot = value,
            }
        }

        merged
    }

    pub fn categories(&self) -> Vec<String> {
        self.tree.read().keys().cloned().collect()
    }

    /// Search entries whose key or content contains `query`.
    ///
    /// Matching is case-insensitive. Results are ordered by relevance, highest
    /// first, and capped at the search limit. A blank query or an unknown
    /// category yields nothing.
    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<KnowledgeEntry> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let tree = self.tree.read();
        let mut results = Vec::new();

        for (name, data) in tree.iter() {
            if category.is_some_and(|c| c != name) {
                continue;
            }

            match data {
                Value::Object(entries) => {
                    for (key, value) in entries {
                        let key_text = key.to_lowercase();
                        let value_text = text_of(value).to_lowercase();
                        if key_text.contains(&query) || value_text.contains(&query) {
                            results.push(KnowledgeEntry {
                                category: name.clone(),
                                entry_type: Some(key.clone()),
                                content: value.clone(),
                                relevance_score: relevance(&query, &(key_text + &value_text)),
                            });
                        }
                    }
                },
                Value::Array(items) => {
                    for item in items {
                        let item_text = text_of(item).to_lowercase();
                        if item_text.contains(&query) {
                            results.push(KnowledgeEntry {
                                category: name.clone(),
                                entry_type: None,
                                content: item.clone(),
                                relevance_score: relevance(&query, &item_text),
                            });
                        }
                    }
                },
                _ => {},
            }
        }

        results.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
        });
        results.truncate(SEARCH_LIMIT);

        tracing::debug!(query = %query, hits = results.len(), "Knowledge search");
        results
    }

    /// Template by name from any category carrying a `templates` mapping
    pub fn template(&self, name: &str) -> Option<Value> {
        let tree = self.tree.read();
        tree.values()
            .filter_map(Value::as_object)
            .flat_map(|entries| entries.values())
            .filter_map(|entry| entry.get("templates"))
            .find_map(|templates| templates.get(name))
            .cloned()
    }

    /// Practices for a topic plus the senior reps' own practices
    pub fn best_practices(&self, topic: &str) -> Vec<BestPractice> {
        let tree = self.tree.read();
        let mut practices = Vec::new();

        if let Some(value) = tree
            .get(categories::SALES_BEST_PRACTICES)
            .and_then(|c| c.get(topic))
        {
            practices.push(BestPractice {
                title: topic.to_string(),
                achievement: None,
                practices: value.clone(),
                source: categories::SALES_BEST_PRACTICES.to_string(),
            });
        }

        let performers = tree
            .get(categories::SENIOR_EXAMPLES)
            .and_then(|c| c.get("top_performer_practices"))
            .and_then(Value::as_array);

        for performer in performers.into_iter().flatten() {
            let Some(name) = performer.get("name").and_then(Value::as_str) else {
                continue;
            };
            practices.push(BestPractice {
                title: format!("{}'s practices", name),
                achievement: performer
                    .get("achievement")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                practices: performer
                    .get("key_practices")
                    .cloned()
                    .unwrap_or(Value::Array(Vec::new())),
                source: categories::SENIOR_EXAMPLES.to_string(),
            });
        }

        practices
    }

    /// Playbook for a challenge: exact key first, then a case-insensitive
    /// containment match in either direction
    pub fn solution_for_challenge(&self, challenge: &str) -> Option<ChallengeMatch> {
        let tree = self.tree.read();
        let challenges = tree.get(categories::COMMON_CHALLENGES)?.as_object()?;

        if let Some(solution) = challenges.get(challenge) {
            return Some(ChallengeMatch {
                challenge: challenge.to_string(),
                solution: solution.clone(),
                match_type: MatchType::ExactMatch,
            });
        }

        let needle = challenge.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        challenges
            .iter()
            .find(|(key, _)| {
                let key = key.to_lowercase();
                key.contains(&needle) || needle.contains(&key)
            })
            .map(|(key, solution)| ChallengeMatch {
                challenge: key.clone(),
                solution: solution.clone(),
                match_type: MatchType::PartialMatch,
            })
    }

    /// Company mission, vision and values; empty object when absent
    pub fn company_values(&self) -> Value {
        self.tree
            .read()
            .get(categories::COMPANY_INFO)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()))
    }

    /// Insert or replace an entry. Creates the category when missing.
    ///
    /// Returns `false` when the category exists but is not a mapping.
    pub fn add_knowledge(&self, category: &str, key: &str, content: Value) -> bool {
        let mut tree = self.tree.write();
        let entry = tree
            .entry(category.to_string())
            .or_insert_with(|| Value::Object(Map::new()));

        match entry {
            Value::Object(entries) => {
                entries.insert(key.to_string(), content);
                tracing::info!(category, key, "Knowledge entry added");
                true
            },
            _ => {
                tracing::warn!(category, "Knowledge category is not a mapping");
                false
            },
        }
    }
}

/// Flat text used for matching
fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn relevance(query: &str, text: &str) -> f32 {
    let words: Vec<&str> = query.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let found = words.iter().filter(|w| text.contains(*w)).count();
    found as f32 / words.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> KnowledgeStore {
        KnowledgeStore::builtin().unwrap()
    }

    #[test]
    fn test_builtin_categories() {
        let categories = store().categories();
        for name in [
            categories::COMPANY_INFO,
            categories::SALES_BEST_PRACTICES,
            categories::SENIOR_EXAMPLES,
            categories::COMMON_CHALLENGES,
            categories::TOOLS_AND_RESOURCES,
        ] {
            assert!(categories.iter().any(|c| c == name), "missing {}", name);
        }
    }

    #[test]
    fn test_search_by_key() {
        let results = store().search("Presentation", None);
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .any(|r| r.entry_type.as_deref() == Some("presentation")));
        assert!(results.len() <= SEARCH_LIMIT);
    }

    #[test]
    fn test_search_orders_by_relevance() {
        let store = KnowledgeStore::from_value(json!({
            "notes": {
                "a": "call the customer",
                "b": "call the customer every week"
            }
        }))
        .unwrap();

        let results = store.search("customer", None);
        assert_eq!(results.len(), 2);

        let results = store.search("call", Some("notes"));
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.relevance_score == 1.0));

        // only one entry contains the whole phrase
        let results = store.search("customer every", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry_type.as_deref(), Some("b"));
    }

    #[test]
    fn test_search_list_category() {
        let store = KnowledgeStore::from_value(json!({
            "tips": ["Follow up within 24 hours", "Share industry news"]
        }))
        .unwrap();
        let results = store.search("follow up", None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].entry_type, None);
        assert_eq!(results[0].relevance_score, 1.0);
    }

    #[test]
    fn test_search_unknown_category_or_blank_query() {
        let store = store();
        assert!(store.search("presentation", Some("nope")).is_empty());
        assert!(store.search("   ", None).is_empty());
    }

    #[test]
    fn test_template_lookup() {
        let store = store();
        let script = store.template("phone_script").unwrap();
        assert!(script.get("opening").is_some());
        assert!(store.template("fax_cover").is_none());
    }

    #[test]
    fn test_best_practices_include_seniors() {
        let practices = store().best_practices("presentation");
        assert_eq!(practices[0].source, categories::SALES_BEST_PRACTICES);
        let seniors: Vec<_> = practices
            .iter()
            .filter(|p| p.source == categories::SENIOR_EXAMPLES)
            .collect();
        assert_eq!(seniors.len(), 2);
        assert!(seniors[0].title.ends_with("'s practices"));
        assert!(seniors[0].achievement.is_some());

        let practices = store().best_practices("cold_calling");
        assert!(practices
            .iter()
            .all(|p| p.source == categories::SENIOR_EXAMPLES));
    }

    #[test]
    fn test_solution_for_challenge() {
        let store = store();

        let exact = store.solution_for_challenge("Fear of rejection").unwrap();
        assert_eq!(exact.match_type, MatchType::ExactMatch);
        assert!(exact.headline().is_some());

        let partial = store.solution_for_challenge("finding time").unwrap();
        assert_eq!(partial.match_type, MatchType::PartialMatch);
        assert_eq!(partial.challenge, "Finding time");
        assert_eq!(
            partial.headline().as_deref(),
            Some("Move part of prospecting time to following up existing customers")
        );

        assert!(store.solution_for_challenge("printer jams").is_none());
    }

    #[test]
    fn test_company_values() {
        let values = store().company_values();
        assert_eq!(values["values"].as_array().map(Vec::len), Some(5));
        assert_eq!(KnowledgeStore::empty().company_values(), json!({}));
    }

    #[test]
    fn test_add_knowledge() {
        let store = KnowledgeStore::from_value(json!({ "tips": ["a"] })).unwrap();
        assert!(store.add_knowledge("playbooks", "renewals", json!("Call 90 days early")));
        assert_eq!(store.search("renewals", None).len(), 1);
        assert!(!store.add_knowledge("tips", "x", json!("y")));
    }

    #[test]
    fn test_merge_extends_mappings() {
        let store = store();
        let incoming = json!({
            "common_challenges": { "Long sales cycles": { "solutions": ["Map the buying committee"] } },
            "glossary": ["ROI: return on investment"]
        });
        let merged = match incoming {
            Value::Object(map) => store.merge(map),
            _ => unreachable!(),
        };
        assert_eq!(merged, 2);
        assert!(store.solution_for_challenge("Fear of rejection").is_some());
        assert!(store.solution_for_challenge("Long sales cycles").is_some());
        assert!(store.categories().iter().any(|c| c == "glossary"));
    }

    #[test]
    fn test_top_level_must_be_mapping() {
        assert!(matches!(
            KnowledgeStore::from_value(json!(["x"])),
            Err(KnowledgeError::InvalidFormat(_))
        ));
    }
}
