// src/catalog/mod.rs
// The tool catalog (§3 "Tool catalog entry", §4.2, §10): an immutable
// runtime registry of every operation the server exposes. Grounded in
// spirit on crates/mira-server/src/mcp/mod.rs's per-tool
// `#[tool(description = "...")]` metadata, reproduced as a static runtime
// table instead of compile-time macro output so introspection, the
// validation pipeline's alias tables, and the three surfaces in P1 all
// read from one source of truth.

pub mod schema;

use std::sync::LazyLock;

use schema::{ArgSchema, FieldSpec, FieldType};
use serde::Serialize;

use crate::models::{ContextType, DecisionStatus, DecisionType, ImpactLevel, TaskStatus};

fn enum_values(names: &[&'static str]) -> FieldType {
    FieldType::Enum {
        values: names.to_vec(),
    }
}

fn context_type_names() -> Vec<&'static str> {
    ContextType::ALL.iter().map(ContextType::as_str).collect()
}

fn impact_level_names() -> Vec<&'static str> {
    ImpactLevel::ALL.iter().map(ImpactLevel::as_str).collect()
}

fn decision_type_names() -> Vec<&'static str> {
    DecisionType::ALL.iter().map(DecisionType::as_str).collect()
}

fn decision_status_names() -> Vec<&'static str> {
    DecisionStatus::ALL.iter().map(DecisionStatus::as_str).collect()
}

fn task_status_names() -> Vec<&'static str> {
    TaskStatus::ALL.iter().map(TaskStatus::as_str).collect()
}

/// Names matching `^[a-z][a-z0-9_]*$`, per §3.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCatalogEntry {
    pub name: &'static str,
    pub category: &'static str,
    pub description: &'static str,
    pub schema: ArgSchema,
    pub examples: &'static [&'static str],
}

pub const INTROSPECTION_TOOLS: &[&str] = &[
    "aidis_help",
    "aidis_explain",
    "aidis_examples",
    "aidis_ping",
    "aidis_status",
];

pub fn is_introspection_tool(name: &str) -> bool {
    INTROSPECTION_TOOLS.contains(&name)
}

fn field(name: &'static str, field_type: FieldType, required: bool, description: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        field_type,
        required,
        description,
        aliases: &[],
        default: None,
    }
}

fn optional(name: &'static str, field_type: FieldType, description: &'static str) -> FieldSpec {
    field(name, field_type, false, description)
}

fn aliased(mut f: FieldSpec, aliases: &'static [&'static str]) -> FieldSpec {
    f.aliases = aliases;
    f
}

fn defaulted(mut f: FieldSpec, default: serde_json::Value) -> FieldSpec {
    f.default = Some(default);
    f
}

pub static CATALOG: LazyLock<Vec<ToolCatalogEntry>> = LazyLock::new(build_catalog);

fn build_catalog() -> Vec<ToolCatalogEntry> {
    vec![
        // --- Introspection (§4.2) ---
        ToolCatalogEntry {
            name: "aidis_help",
            category: "introspection",
            description: "List all tools grouped by category",
            schema: ArgSchema::new(vec![]),
            examples: &["{}"],
        },
        ToolCatalogEntry {
            name: "aidis_explain",
            category: "introspection",
            description: "Return the catalog entry for one tool in expanded form",
            schema: ArgSchema::new(vec![field("name", FieldType::string(), true, "Tool name to explain")]),
            examples: &[r#"{"name": "context_store"}"#],
        },
        ToolCatalogEntry {
            name: "aidis_examples",
            category: "introspection",
            description: "Return 1-3 concrete example invocations of a tool",
            schema: ArgSchema::new(vec![field("name", FieldType::string(), true, "Tool name")]),
            examples: &[r#"{"name": "context_search"}"#],
        },
        ToolCatalogEntry {
            name: "aidis_ping",
            category: "introspection",
            description: "Liveness echo",
            schema: ArgSchema::new(vec![optional("message", FieldType::string(), "Message to echo back")]),
            examples: &[r#"{"message": "hi"}"#, "{}"],
        },
        ToolCatalogEntry {
            name: "aidis_status",
            category: "introspection",
            description: "Server uptime, database connectivity, tool count, open session count",
            schema: ArgSchema::new(vec![]),
            examples: &["{}"],
        },
        // --- Project (§10) ---
        ToolCatalogEntry {
            name: "project_create",
            category: "project",
            description: "Create a new project",
            schema: ArgSchema::new(vec![
                field("name", FieldType::bounded_string(Some(1), Some(200)), true, "Unique project name"),
                optional("description", FieldType::string(), "Free-form description"),
            ]),
            examples: &[r#"{"name": "aidis-core"}"#],
        },
        ToolCatalogEntry {
            name: "project_list",
            category: "project",
            description: "List all projects",
            schema: ArgSchema::new(vec![]),
            examples: &["{}"],
        },
        ToolCatalogEntry {
            name: "project_current",
            category: "project",
            description: "Return the calling session's resolved current project",
            schema: ArgSchema::new(vec![]),
            examples: &["{}"],
        },
        ToolCatalogEntry {
            name: "project_switch",
            category: "project",
            description: "Set the session's current project explicitly",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id"),
                optional("name", FieldType::string(), "Project name"),
            ]),
            examples: &[r#"{"name": "aidis-core"}"#],
        },
        ToolCatalogEntry {
            name: "project_set_primary",
            category: "project",
            description: "Promote a project to the system-wide primary",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id"),
                optional("name", FieldType::string(), "Project name"),
            ]),
            examples: &[r#"{"name": "aidis-core"}"#],
        },
        // --- Session (§10) ---
        ToolCatalogEntry {
            name: "session_status",
            category: "session",
            description: "Current session's lifecycle state and activity counters",
            schema: ArgSchema::new(vec![]),
            examples: &["{}"],
        },
        ToolCatalogEntry {
            name: "session_end",
            category: "session",
            description: "Explicitly end the calling session",
            schema: ArgSchema::new(vec![]),
            examples: &["{}"],
        },
        // --- Context (§4.5) ---
        ToolCatalogEntry {
            name: "context_store",
            category: "context",
            description: "Embed and persist a context entry",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                field(
                    "type",
                    enum_values(&context_type_names()),
                    true,
                    "Category tag",
                ),
                field("content", FieldType::bounded_string(Some(1), None), true, "Content to store"),
                optional("tags", FieldType::string_array(), "Optional tag list"),
            ]),
            examples: &[r#"{"type": "decision", "content": "Use BullMQ for job queues"}"#],
        },
        ToolCatalogEntry {
            name: "context_search",
            category: "context",
            description: "Similarity search over stored context entries",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                field("query", FieldType::bounded_string(Some(1), None), true, "Search query"),
                defaulted(
                    optional("limit", FieldType::bounded_integer(Some(1), Some(100)), "Max results"),
                    serde_json::json!(10),
                ),
                optional("typeFilter", FieldType::string(), "Filter by category"),
                optional("tagFilter", FieldType::string_array(), "Filter by tags"),
            ]),
            examples: &[r#"{"query": "which queue library?", "limit": 3}"#],
        },
        ToolCatalogEntry {
            name: "context_get_recent",
            category: "context",
            description: "Most recent context entries, no embedding work",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                defaulted(
                    optional("limit", FieldType::bounded_integer(Some(1), Some(100)), "Max results"),
                    serde_json::json!(5),
                ),
            ]),
            examples: &[r#"{"limit": 5}"#],
        },
        ToolCatalogEntry {
            name: "context_stats",
            category: "context",
            description: "Counts of stored context entries by type",
            schema: ArgSchema::new(vec![optional(
                "projectId",
                FieldType::string(),
                "Project id; defaults to the session's current project",
            )]),
            examples: &["{}"],
        },
        // --- Decision (§3, §10) ---
        ToolCatalogEntry {
            name: "decision_record",
            category: "decision",
            description: "Record an architectural decision",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                field("title", FieldType::bounded_string(Some(1), Some(200)), true, "Short title"),
                field("problem", FieldType::string(), true, "The problem being solved"),
                field("decision", FieldType::string(), true, "What was decided"),
                aliased(
                    field("rationale", FieldType::string(), true, "Why this decision was made"),
                    &["reasoning", "reason", "why"],
                ),
                aliased(
                    optional("alternativesConsidered", FieldType::string_array(), "Alternatives considered, in order"),
                    &["options", "alternatives", "choices"],
                ),
                aliased(
                    field(
                        "impactLevel",
                        enum_values(&impact_level_names()),
                        true,
                        "Impact level",
                    ),
                    &["impact", "severity", "priority"],
                ),
                aliased(
                    field(
                        "decisionType",
                        enum_values(&decision_type_names()),
                        true,
                        "Domain category",
                    ),
                    &["decision_type"],
                ),
            ]),
            examples: &[
                r#"{"title":"X","problem":"Y","decision":"Z","reasoning":"because","impact":"high","decisionType":"architecture"}"#,
            ],
        },
        ToolCatalogEntry {
            name: "decision_list",
            category: "decision",
            description: "List technical decisions",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                optional(
                    "status",
                    enum_values(&decision_status_names()),
                    "Filter by status",
                ),
            ]),
            examples: &["{}"],
        },
        ToolCatalogEntry {
            name: "decision_update",
            category: "decision",
            description: "Update a decision's status or outcome",
            schema: ArgSchema::new(vec![
                field("decisionId", FieldType::string(), true, "Decision id"),
                optional(
                    "status",
                    enum_values(&decision_status_names()),
                    "New status",
                ),
                optional("supersededBy", FieldType::string(), "Id of the superseding decision"),
                optional("outcome", FieldType::string(), "Outcome annotation"),
            ]),
            examples: &[r#"{"decisionId": "...", "status": "deprecated"}"#],
        },
        // --- Task (§3, §10) ---
        ToolCatalogEntry {
            name: "task_create",
            category: "task",
            description: "Create a coordination task",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                field("title", FieldType::bounded_string(Some(1), Some(200)), true, "Task title"),
                optional("description", FieldType::string(), "Task description"),
                defaulted(
                    optional("priority", FieldType::string(), "Priority"),
                    serde_json::json!("medium"),
                ),
                optional("dependsOn", FieldType::string_array(), "Ids of tasks this depends on"),
            ]),
            examples: &[r#"{"title": "Wire up the pool"}"#],
        },
        ToolCatalogEntry {
            name: "task_list",
            category: "task",
            description: "List tasks",
            schema: ArgSchema::new(vec![
                optional("projectId", FieldType::string(), "Project id; defaults to the session's current project"),
                optional(
                    "status",
                    enum_values(&task_status_names()),
                    "Filter by status",
                ),
            ]),
            examples: &["{}"],
        },
        ToolCatalogEntry {
            name: "task_update",
            category: "task",
            description: "Update a task's status, priority, or dependencies",
            schema: ArgSchema::new(vec![
                field("taskId", FieldType::string(), true, "Task id"),
                optional(
                    "status",
                    enum_values(&task_status_names()),
                    "New status",
                ),
                optional("priority", FieldType::string(), "New priority"),
                optional(
                    "dependsOn",
                    FieldType::string_array(),
                    "Replace this task's dependency ids; rejected if it would introduce a cycle",
                ),
            ]),
            examples: &[r#"{"taskId": "...", "status": "completed"}"#],
        },
    ]
}

pub fn lookup(name: &str) -> Option<&'static ToolCatalogEntry> {
    CATALOG.iter().find(|entry| entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_no_duplicate_names() {
        let mut names: Vec<&str> = CATALOG.iter().map(|e| e.name).collect();
        let before = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), before, "duplicate tool name in catalog");
    }

    #[test]
    fn catalog_names_match_the_declared_pattern() {
        for entry in CATALOG.iter() {
            assert!(!entry.name.is_empty());
            let mut chars = entry.name.chars();
            let first = chars.next().expect("non-empty");
            assert!(first.is_ascii_lowercase(), "{} must start lowercase", entry.name);
            assert!(
                entry.name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{} must match ^[a-z][a-z0-9_]*$",
                entry.name
            );
        }
    }

    #[test]
    fn introspection_tools_are_all_present_in_the_catalog() {
        for name in INTROSPECTION_TOOLS {
            assert!(lookup(name).is_some(), "{} missing from catalog", name);
        }
    }

    fn enum_field_values<'a>(entry: &'a ToolCatalogEntry, field_name: &str) -> &'a [&'static str] {
        match &entry.schema.field(field_name).expect("field present").field_type {
            FieldType::Enum { values } => values,
            other => panic!("expected {field_name} to be an enum field, got {other:?}"),
        }
    }

    #[test]
    fn context_store_type_enum_matches_the_context_type_model() {
        let entry = lookup("context_store").expect("present");
        assert_eq!(enum_field_values(entry, "type"), context_type_names().as_slice());
    }

    #[test]
    fn decision_record_enum_fields_match_their_models() {
        let entry = lookup("decision_record").expect("present");
        assert_eq!(
            enum_field_values(entry, "impactLevel"),
            impact_level_names().as_slice()
        );
        assert_eq!(
            enum_field_values(entry, "decisionType"),
            decision_type_names().as_slice()
        );
    }

    #[test]
    fn decision_list_and_update_status_enums_match_the_decision_status_model() {
        for name in ["decision_list", "decision_update"] {
            let entry = lookup(name).expect("present");
            assert_eq!(
                enum_field_values(entry, "status"),
                decision_status_names().as_slice(),
                "{name} status enum out of sync with DecisionStatus"
            );
        }
    }

    #[test]
    fn task_list_and_update_status_enums_match_the_task_status_model() {
        for name in ["task_list", "task_update"] {
            let entry = lookup(name).expect("present");
            assert_eq!(
                enum_field_values(entry, "status"),
                task_status_names().as_slice(),
                "{name} status enum out of sync with TaskStatus"
            );
        }
    }

    #[test]
    fn decision_record_alias_table_resolves_to_canonical_names() {
        let entry = lookup("decision_record").expect("present");
        assert_eq!(entry.schema.canonicalize("reasoning"), Some("rationale"));
        assert_eq!(entry.schema.canonicalize("reason"), Some("rationale"));
        assert_eq!(entry.schema.canonicalize("why"), Some("rationale"));
        assert_eq!(entry.schema.canonicalize("impact"), Some("impactLevel"));
        assert_eq!(entry.schema.canonicalize("severity"), Some("impactLevel"));
        assert_eq!(
            entry.schema.canonicalize("alternatives"),
            Some("alternativesConsidered")
        );
    }
}
