//! CSV registry store fetched over HTTP.
//!
//! The registry is a CSV document mapping (workflow, project, agent) keys
//! to configuration URLs. Columns are resolved by header name, so
//! reordering or appending columns never breaks the parser.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::domain::errors::RegistryError;
use crate::domain::models::{AgentKey, RegistryRow};
use crate::domain::ports::{DocumentFetcher, RegistryStore};

/// Registry store reading a remote CSV document on every lookup.
///
/// Freshness across lookups comes from the config cache above this layer,
/// not from caching the document here.
pub struct CsvRegistryStore {
    fetcher: Arc<dyn DocumentFetcher>,
    registry_url: String,
}

impl CsvRegistryStore {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, registry_url: impl Into<String>) -> Self {
        Self {
            fetcher,
            registry_url: registry_url.into(),
        }
    }
}

#[async_trait]
impl RegistryStore for CsvRegistryStore {
    async fn lookup(&self, key: &AgentKey) -> Result<RegistryRow, RegistryError> {
        let csv = self.fetcher.fetch_text(&self.registry_url).await?;
        let rows = parse_registry(&csv)?;
        debug!(rows = rows.len(), key = %key, "registry document parsed");

        let mut matching = rows.iter().filter(|row| row.matches(key));
        let Some(first) = matching.next() else {
            return Err(RegistryError::NoMatch {
                workflow_id: key.workflow_id.clone(),
                project_id: key.project_id.clone(),
                agent_id: key.agent_id.clone(),
            });
        };

        let duplicates = matching.count();
        if duplicates > 0 {
            warn!(
                key = %key,
                duplicates,
                "registry contains duplicate rows for key; using first in document order"
            );
        }

        Ok(first.clone())
    }
}

/// Parse the registry CSV into rows, resolving fields by header name.
///
/// Blank lines are skipped. Rows may omit optional trailing columns; a row
/// with more fields than the header declares is malformed.
pub fn parse_registry(text: &str) -> Result<Vec<RegistryRow>, RegistryError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let Some(header_line) = lines.next() else {
        return Err(RegistryError::MalformedDocument(
            "empty registry document".to_string(),
        ));
    };
    let headers: Vec<String> = split_csv_line(header_line)
        .into_iter()
        .map(|header| header.trim().to_ascii_lowercase())
        .collect();

    let column = |name: &str| headers.iter().position(|header| header == name);
    for required in ["workflow_id", "project_id", "agent_id"] {
        if column(required).is_none() {
            return Err(RegistryError::MalformedDocument(format!(
                "missing required column '{required}'"
            )));
        }
    }

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let values = split_csv_line(line);
        if values.len() > headers.len() {
            return Err(RegistryError::MalformedDocument(format!(
                "row {} has {} fields but header declares {}",
                index + 2,
                values.len(),
                headers.len()
            )));
        }

        let field = |name: &str| {
            column(name)
                .and_then(|position| values.get(position))
                .map(|value| value.trim().to_string())
                .unwrap_or_default()
        };

        rows.push(RegistryRow {
            workflow_id: field("workflow_id"),
            project_id: field("project_id"),
            agent_id: field("agent_id"),
            agent_type: field("agent_type"),
            description: field("description"),
            prompt_url: field("prompt_url"),
            processor_url: field("processor_url"),
            mcp_endpoint: field("mcp_endpoint"),
            tools_config_url: field("tools_config_url"),
            status: column("status").map(|_| field("status")),
            version: column("version").map(|_| field("version")),
        });
    }

    Ok(rows)
}

/// Split one CSV line, honoring double-quoted fields and `""` escapes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "\
workflow_id,project_id,agent_id,agent_type,description,prompt_url,processor_url,mcp_endpoint,tools_config_url,status,version
work-1001,project_001,agent_001,enhanced_research,Market research,https://docs.example/a1.json,,https://mcp.brightdata.com/sse,,active,1.2
work-1001,project_001,agent_002,fiscal_research,Tax research,https://docs.example/a2.json,,,,inactive,1.0
";

    fn key(agent_id: &str) -> AgentKey {
        AgentKey::new("work-1001", "project_001", agent_id)
    }

    #[test]
    fn parses_canonical_registry() {
        let rows = parse_registry(CANONICAL).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].agent_type, "enhanced_research");
        assert_eq!(rows[0].status.as_deref(), Some("active"));
        assert_eq!(rows[0].version.as_deref(), Some("1.2"));
    }

    #[test]
    fn resolves_columns_by_header_name_not_index() {
        let reordered = "\
agent_id,workflow_id,prompt_url,project_id
agent_001,work-1001,https://docs.example/a1.json,project_001
";
        let rows = parse_registry(reordered).unwrap();
        assert!(rows[0].matches(&key("agent_001")));
        assert_eq!(rows[0].prompt_url, "https://docs.example/a1.json");
        // columns absent from the header come back empty, not shifted
        assert_eq!(rows[0].mcp_endpoint, "");
        assert!(rows[0].status.is_none());
    }

    #[test]
    fn skips_blank_lines() {
        let with_blanks = "\
workflow_id,project_id,agent_id

work-1001,project_001,agent_001

";
        let rows = parse_registry(with_blanks).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn tolerates_missing_trailing_columns() {
        let short_row = "\
workflow_id,project_id,agent_id,agent_type,status
work-1001,project_001,agent_001
";
        let rows = parse_registry(short_row).unwrap();
        assert_eq!(rows[0].agent_type, "");
        // status column exists in the header, so the row reads as empty
        // status rather than column-absent
        assert_eq!(rows[0].status.as_deref(), Some(""));
    }

    #[test]
    fn rejects_rows_wider_than_header() {
        let wide = "\
workflow_id,project_id,agent_id
work-1001,project_001,agent_001,surprise
";
        assert!(matches!(
            parse_registry(wide),
            Err(RegistryError::MalformedDocument(_))
        ));
    }

    #[test]
    fn rejects_missing_required_columns() {
        let no_agent = "workflow_id,project_id\nwork-1001,project_001\n";
        assert!(matches!(
            parse_registry(no_agent),
            Err(RegistryError::MalformedDocument(_))
        ));
    }

    #[test]
    fn quoted_fields_keep_embedded_commas() {
        let quoted = "\
workflow_id,project_id,agent_id,description
work-1001,project_001,agent_001,\"Research, analysis, and \"\"docs\"\"\"
";
        let rows = parse_registry(quoted).unwrap();
        assert_eq!(rows[0].description, "Research, analysis, and \"docs\"");
    }

    #[test]
    fn inactive_rows_are_not_selectable() {
        let rows = parse_registry(CANONICAL).unwrap();
        assert!(!rows[1].matches(&key("agent_002")));
    }
}
