//! Domain entities from §3: Project, Session, Context entry, Technical
//! decision, Task. These mirror the authoritative Postgres schema (§6)
//! field-for-field; `sqlx::FromRow` derives the row mapping directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_primary(&self) -> bool {
        self.metadata
            .get("is_primary")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub display_id: String,
    pub project_id: Option<Uuid>,
    pub agent_type: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub contexts_created: i32,
    pub tasks_created: i32,
    pub tasks_updated: i32,
    pub tasks_completed: i32,
}

/// Category tag for a context entry; the fixed small set from §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextType {
    Code,
    Decision,
    Error,
    Discussion,
    Planning,
    Completion,
    Milestone,
    Reflections,
    Handoff,
}

impl ContextType {
    pub const ALL: &'static [ContextType] = &[
        ContextType::Code,
        ContextType::Decision,
        ContextType::Error,
        ContextType::Discussion,
        ContextType::Planning,
        ContextType::Completion,
        ContextType::Milestone,
        ContextType::Reflections,
        ContextType::Handoff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextType::Code => "code",
            ContextType::Decision => "decision",
            ContextType::Error => "error",
            ContextType::Discussion => "discussion",
            ContextType::Planning => "planning",
            ContextType::Completion => "completion",
            ContextType::Milestone => "milestone",
            ContextType::Reflections => "reflections",
            ContextType::Handoff => "handoff",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: Uuid,
    pub project_id: Uuid,
    pub session_id: Option<Uuid>,
    pub context_type: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A context row joined with its similarity score, produced only by
/// `context.search` (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredContextEntry {
    #[serde(flatten)]
    pub entry: ContextEntry,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    pub const ALL: &'static [ImpactLevel] = &[
        ImpactLevel::Low,
        ImpactLevel::Medium,
        ImpactLevel::High,
        ImpactLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Low => "low",
            ImpactLevel::Medium => "medium",
            ImpactLevel::High => "high",
            ImpactLevel::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(ImpactLevel::Low),
            "medium" => Some(ImpactLevel::Medium),
            "high" => Some(ImpactLevel::High),
            "critical" => Some(ImpactLevel::Critical),
            _ => None,
        }
    }
}

/// Domain category for a technical decision. §3 says "~15 domain
/// categories"; this set covers the common architecture-decision-record
/// taxonomy without inventing Mira-specific categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionType {
    Architecture,
    Library,
    Framework,
    Database,
    ApiDesign,
    Security,
    Performance,
    Deployment,
    Testing,
    CodingStyle,
    ToolChoice,
    Process,
    Infrastructure,
    DataModel,
    Other,
}

impl DecisionType {
    pub const ALL: &'static [DecisionType] = &[
        DecisionType::Architecture,
        DecisionType::Library,
        DecisionType::Framework,
        DecisionType::Database,
        DecisionType::ApiDesign,
        DecisionType::Security,
        DecisionType::Performance,
        DecisionType::Deployment,
        DecisionType::Testing,
        DecisionType::CodingStyle,
        DecisionType::ToolChoice,
        DecisionType::Process,
        DecisionType::Infrastructure,
        DecisionType::DataModel,
        DecisionType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Architecture => "architecture",
            DecisionType::Library => "library",
            DecisionType::Framework => "framework",
            DecisionType::Database => "database",
            DecisionType::ApiDesign => "api_design",
            DecisionType::Security => "security",
            DecisionType::Performance => "performance",
            DecisionType::Deployment => "deployment",
            DecisionType::Testing => "testing",
            DecisionType::CodingStyle => "coding_style",
            DecisionType::ToolChoice => "tool_choice",
            DecisionType::Process => "process",
            DecisionType::Infrastructure => "infrastructure",
            DecisionType::DataModel => "data_model",
            DecisionType::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Active,
    Deprecated,
    Superseded,
    UnderReview,
}

impl DecisionStatus {
    pub const ALL: &'static [DecisionStatus] = &[
        DecisionStatus::Active,
        DecisionStatus::Deprecated,
        DecisionStatus::Superseded,
        DecisionStatus::UnderReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Active => "active",
            DecisionStatus::Deprecated => "deprecated",
            DecisionStatus::Superseded => "superseded",
            DecisionStatus::UnderReview => "under_review",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(DecisionStatus::Active),
            "deprecated" => Some(DecisionStatus::Deprecated),
            "superseded" => Some(DecisionStatus::Superseded),
            "under_review" => Some(DecisionStatus::UnderReview),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TechnicalDecision {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub problem: String,
    pub decision: String,
    pub rationale: String,
    pub alternatives_considered: Vec<String>,
    pub impact_level: String,
    pub decision_type: String,
    pub status: String,
    pub superseded_by: Option<Uuid>,
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Blocked,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub const ALL: &'static [TaskStatus] = &[
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Blocked,
        TaskStatus::Completed,
        TaskStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Completed => "completed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "todo" => Some(TaskStatus::Todo),
            "in_progress" => Some(TaskStatus::InProgress),
            "blocked" => Some(TaskStatus::Blocked),
            "completed" => Some(TaskStatus::Completed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    /// Dependencies in this status satisfy a dependent task's completion
    /// requirement (§3: "completed if all dependencies are completed or
    /// cancelled").
    pub fn satisfies_dependency(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub session_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub priority: String,
    pub assignee: Option<String>,
    pub depends_on: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
