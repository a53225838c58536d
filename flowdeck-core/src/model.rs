//! Wire and domain types for the workflow catalogue

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Category assigned to any filename the mapping does not cover
pub const UNCATEGORIZED: &str = "Uncategorized";

/// What initiates a workflow
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TriggerType {
    #[default]
    Manual,
    Webhook,
    Scheduled,
    Complex,
    /// A trigger kind this client does not know about yet
    Other(String),
}

impl TriggerType {
    /// The known trigger kinds, in filter-menu order
    pub const KNOWN: [TriggerType; 4] = [
        TriggerType::Manual,
        TriggerType::Webhook,
        TriggerType::Scheduled,
        TriggerType::Complex,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            TriggerType::Manual => "Manual",
            TriggerType::Webhook => "Webhook",
            TriggerType::Scheduled => "Scheduled",
            TriggerType::Complex => "Complex",
            TriggerType::Other(s) => s,
        }
    }
}

impl From<String> for TriggerType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "manual" => TriggerType::Manual,
            "webhook" => TriggerType::Webhook,
            "scheduled" | "schedule" => TriggerType::Scheduled,
            "complex" => TriggerType::Complex,
            _ => TriggerType::Other(value),
        }
    }
}

impl From<TriggerType> for String {
    fn from(value: TriggerType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size bucket derived from node count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

impl Complexity {
    pub const ALL: [Complexity; 3] = [Complexity::Low, Complexity::Medium, Complexity::High];

    /// ≤5 nodes is low, 6-15 medium, 16+ high
    pub fn from_node_count(node_count: u32) -> Self {
        match node_count {
            0..=5 => Complexity::Low,
            6..=15 => Complexity::Medium,
            _ => Complexity::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Complexity::Low => "low",
            Complexity::Medium => "medium",
            Complexity::High => "high",
        }
    }
}

impl From<String> for Complexity {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "medium" => Complexity::Medium,
            "high" => Complexity::High,
            _ => Complexity::Low,
        }
    }
}

impl From<Complexity> for String {
    fn from(value: Complexity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workflow record as returned by the listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    /// Unique key
    pub filename: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "flexible_bool")]
    pub active: bool,
    #[serde(default)]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub complexity: Complexity,
    #[serde(default)]
    pub node_count: u32,
    #[serde(default, deserialize_with = "string_list")]
    pub integrations: Vec<String>,
    /// Raw definition, only present on detail responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_json: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagram: Option<String>,
}

impl Workflow {
    /// Name to show; falls back to a name derived from the filename
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format_workflow_name(&self.filename)
        } else {
            self.name.clone()
        }
    }
}

/// Accepts true/false, 0/1 and the usual truthy strings
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => {
            matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on")
        }
        _ => false,
    })
}

/// Accepts a list, a single string, or null
fn string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => Vec::new(),
        serde_json::Value::String(s) if s.is_empty() => Vec::new(),
        serde_json::Value::String(s) => vec![s],
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub workflows: Vec<Workflow>,
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub pages: usize,
}

/// Catalogue-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub total_nodes: u64,
    #[serde(default)]
    pub unique_integrations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive: Option<u64>,
    #[serde(default)]
    pub triggers: BTreeMap<String, u64>,
    #[serde(default)]
    pub complexity: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_indexed: Option<String>,
}

/// filename → category, loaded once at startup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryMap {
    mappings: HashMap<String, String>,
}

impl CategoryMap {
    pub fn new(mappings: HashMap<String, String>) -> Self {
        Self { mappings }
    }

    /// Category for a filename; blank or missing entries are uncategorized
    pub fn category_of(&self, filename: &str) -> &str {
        match self.mappings.get(filename) {
            Some(category) if !category.trim().is_empty() => category.as_str(),
            _ => UNCATEGORIZED,
        }
    }

    pub fn matches(&self, filename: &str, category: &str) -> bool {
        self.category_of(filename) == category
    }

    /// `(filename, category)` pairs, blank categories reported as uncategorized
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.mappings
            .keys()
            .map(|filename| (filename.as_str(), self.category_of(filename)))
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl FromIterator<(String, String)> for CategoryMap {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Turn `0042_slack_api_automation.json` into `Slack API Automation`
pub fn format_workflow_name(filename: &str) -> String {
    let stem = filename.trim_end_matches(".json");
    let mut parts: Vec<&str> = stem.split('_').filter(|p| !p.is_empty()).collect();

    if parts.len() > 1 && parts[0].chars().all(|c| c.is_ascii_digit()) {
        parts.remove(0);
    }

    parts
        .into_iter()
        .map(|part| match part.to_ascii_lowercase().as_str() {
            "http" => "HTTP".to_string(),
            "api" => "API".to_string(),
            "webhook" => "Webhook".to_string(),
            "automation" => "Automation".to_string(),
            "scheduled" => "Scheduled".to_string(),
            "manual" => "Manual".to_string(),
            "ai" => "AI".to_string(),
            "ml" => "ML".to_string(),
            "csv" => "CSV".to_string(),
            "json" => "JSON".to_string(),
            "xml" => "XML".to_string(),
            "sql" => "SQL".to_string(),
            "ftp" => "FTP".to_string(),
            "smtp" => "SMTP".to_string(),
            "oauth" => "OAuth".to_string(),
            "jwt" => "JWT".to_string(),
            "crud" => "CRUD".to_string(),
            lower => capitalize(lower),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(lower: &str) -> String {
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
