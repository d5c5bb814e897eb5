//! SQL tools exposed to the model.
//!
//! Every tool returns text. Failures are returned as `Error: ...`
//! observations so the model can correct itself.

use crate::prompt;
use tracing::{debug, warn};
use tunesql_catalog::SqlDatabase;
use tunesql_provider::{ChatMessage, CompletionRequest, LlmProvider, ToolCall, ToolDefinition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlTool {
    Query,
    Schema,
    ListTables,
    QueryChecker,
}

impl SqlTool {
    pub const ALL: [SqlTool; 4] = [
        SqlTool::Query,
        SqlTool::Schema,
        SqlTool::ListTables,
        SqlTool::QueryChecker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SqlTool::Query => "sql_db_query",
            SqlTool::Schema => "sql_db_schema",
            SqlTool::ListTables => "sql_db_list_tables",
            SqlTool::QueryChecker => "sql_db_query_checker",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name.trim())
    }

    pub fn description(&self) -> &'static str {
        match self {
            SqlTool::Query => {
                "Input to this tool is a detailed and correct SQL query, output is a result from the database. \
                 If the query is not correct, an error message will be returned. \
                 If an error is returned, rewrite the query, check the query, and try again. \
                 If you encounter an issue with Unknown column 'xxxx' in 'field list', \
                 use sql_db_schema to query the correct table fields."
            }
            SqlTool::Schema => {
                "Input to this tool is a comma-separated list of tables, output is the schema and sample rows for those tables. \
                 Be sure that the tables actually exist by calling sql_db_list_tables first! \
                 Example Input: table1, table2, table3"
            }
            SqlTool::ListTables => {
                "Input is an empty string, output is a comma-separated list of tables in the database."
            }
            SqlTool::QueryChecker => {
                "Use this tool to double check if your query is correct before executing it. \
                 Always use this tool before executing a query with sql_db_query!"
            }
        }
    }

    /// Name and description of the single string argument, if any
    fn argument(&self) -> (&'static str, &'static str) {
        match self {
            SqlTool::Query => ("query", "A detailed and correct SQL query."),
            SqlTool::Schema => ("table_names", "A comma-separated list of the table names."),
            SqlTool::ListTables => ("tool_input", "An empty string"),
            SqlTool::QueryChecker => ("query", "A detailed and SQL query to be checked."),
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        let (arg, description) = self.argument();
        let def = ToolDefinition::new(self.name(), self.description());
        match self {
            // The model may call it with no arguments at all
            SqlTool::ListTables => def,
            _ => def.with_string_argument(arg, description),
        }
    }

    /// Pull this tool's string input out of a JSON arguments payload.
    ///
    /// Falls back to the only string value of the object, and to the raw
    /// payload when it is not JSON.
    pub fn input_from_arguments(&self, arguments: &str) -> String {
        let (arg, _) = self.argument();
        match serde_json::from_str::<serde_json::Value>(arguments) {
            Ok(serde_json::Value::Object(map)) => {
                if let Some(value) = map.get(arg) {
                    return value_as_input(value);
                }
                let mut strings = map.values().filter_map(|v| v.as_str());
                match (strings.next(), strings.next()) {
                    (Some(only), None) => only.to_string(),
                    _ => String::new(),
                }
            }
            Ok(other) => value_as_input(&other),
            Err(_) => arguments.trim().to_string(),
        }
    }
}

fn value_as_input(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        // Some models send table lists as arrays
        serde_json::Value::Array(items) => items
            .iter()
            .map(value_as_input)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Strip markdown fences and a quote pair models put around SQL.
///
/// Quotes inside the query (quoted identifiers, string literals) are kept.
fn clean_query(query: &str) -> &str {
    let mut q = query.trim();
    if let Some(rest) = q.strip_prefix("```") {
        let rest = match rest.get(..3) {
            Some(lang) if lang.eq_ignore_ascii_case("sql") => &rest[3..],
            _ => rest,
        };
        q = rest.strip_suffix("```").unwrap_or(rest).trim();
    }
    for delim in ['`', '"'] {
        if let Some(inner) = q.strip_prefix(delim).and_then(|r| r.strip_suffix(delim)) {
            if !inner.contains(delim) {
                q = inner.trim();
            }
        }
    }
    q
}

/// The tools bound to one database and one model
pub struct SqlToolkit<'a, P: LlmProvider> {
    db: &'a SqlDatabase,
    provider: &'a P,
    temperature: Option<f32>,
}

impl<'a, P: LlmProvider> SqlToolkit<'a, P> {
    pub fn new(db: &'a SqlDatabase, provider: &'a P) -> Self {
        Self {
            db,
            provider,
            temperature: None,
        }
    }

    /// Temperature used by the query checker's own model call
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn tools(&self) -> &'static [SqlTool] {
        &SqlTool::ALL
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools().iter().map(SqlTool::definition).collect()
    }

    /// Run a native tool call. Returns the tool input and the observation.
    pub async fn call(&self, call: &ToolCall) -> (String, String) {
        match SqlTool::from_name(&call.name) {
            Some(tool) => {
                let input = tool.input_from_arguments(&call.arguments);
                let observation = self.run(tool, &input).await;
                (input, observation)
            }
            None => (call.arguments.clone(), self.unknown_tool(&call.name)),
        }
    }

    /// Run a tool addressed by name with a plain-text input
    pub async fn call_named(&self, name: &str, input: &str) -> String {
        match SqlTool::from_name(name) {
            Some(tool) => self.run(tool, input).await,
            None => self.unknown_tool(name),
        }
    }

    fn unknown_tool(&self, name: &str) -> String {
        warn!(tool = name, "model asked for an unknown tool");
        let names: Vec<&str> = self.tools().iter().map(SqlTool::name).collect();
        format!("{} is not a valid tool, try one of [{}].", name.trim(), names.join(", "))
    }

    pub async fn run(&self, tool: SqlTool, input: &str) -> String {
        debug!(tool = tool.name(), input, "running tool");
        match tool {
            SqlTool::ListTables => match self.db.usable_table_names() {
                Ok(names) => names.join(", "),
                Err(e) => format!("Error: {}", e.message()),
            },
            SqlTool::Schema => {
                let names: Vec<&str> = input
                    .split(',')
                    .map(|n| n.trim().trim_matches('"').trim_matches('\''))
                    .filter(|n| !n.is_empty())
                    .collect();
                if names.is_empty() {
                    return "Error: no table names given".to_string();
                }
                match self.db.table_info(Some(names.as_slice())) {
                    Ok(info) => info,
                    Err(e) => format!("Error: {}", e.message()),
                }
            }
            SqlTool::Query => self.db.run_no_throw(clean_query(input)),
            SqlTool::QueryChecker => self.check_query(clean_query(input)).await,
        }
    }

    async fn check_query(&self, query: &str) -> String {
        let prompt = prompt::query_checker(query, self.db.dialect());
        let mut request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        if let Some(t) = self.temperature {
            request = request.with_temperature(t);
        }

        match self.provider.complete(request).await {
            Ok(response) => response.content.unwrap_or_default().trim().to_string(),
            Err(e) => format!("Error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tunesql_catalog::create_database;
    use tunesql_provider::{ProviderError, ScriptedProvider};

    fn seeded() -> (TempDir, SqlDatabase) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("music_library.db");
        create_database(&path).unwrap();
        let db = SqlDatabase::open(&path).unwrap();
        (dir, db)
    }

    #[test]
    fn test_tool_names_round_trip() {
        for tool in SqlTool::ALL {
            assert_eq!(SqlTool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(SqlTool::from_name("drop_everything"), None);
    }

    #[test]
    fn test_definitions() {
        assert_eq!(SqlTool::Query.definition().parameters["required"][0], "query");
        assert_eq!(SqlTool::Schema.definition().parameters["required"][0], "table_names");
        assert_eq!(SqlTool::ListTables.definition().parameters["required"], json!([]));
    }

    #[test]
    fn test_input_from_arguments() {
        assert_eq!(
            SqlTool::Query.input_from_arguments(r#"{"query": "SELECT 1"}"#),
            "SELECT 1"
        );
        // wrong key, single string value
        assert_eq!(SqlTool::Query.input_from_arguments(r#"{"sql": "SELECT 2"}"#), "SELECT 2");
        assert_eq!(
            SqlTool::Schema.input_from_arguments(r#"{"table_names": ["Artists", "Albums"]}"#),
            "Artists, Albums"
        );
        assert_eq!(SqlTool::ListTables.input_from_arguments("{}"), "");
        assert_eq!(SqlTool::Query.input_from_arguments("SELECT 3"), "SELECT 3");
    }

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(clean_query("`SELECT 1`"), "SELECT 1");
        assert_eq!(clean_query("  SELECT 1 "), "SELECT 1");
        assert_eq!(clean_query("```SQL\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(clean_query("\"SELECT 1\""), "SELECT 1");
    }

    #[test]
    fn test_clean_query_keeps_inner_quotes() {
        let quoted = r#"SELECT COUNT(*) FROM "Artists""#;
        assert_eq!(clean_query(quoted), quoted);
        assert_eq!(
            clean_query(r#"SELECT Name FROM Artists WHERE Name = "Queen""#),
            r#"SELECT Name FROM Artists WHERE Name = "Queen""#
        );
        assert_eq!(clean_query(r#""SELECT "Name" FROM Artists""#), r#""SELECT "Name" FROM Artists""#);
    }

    #[tokio::test]
    async fn test_query_tool_with_quoted_identifier() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new();
        let toolkit = SqlToolkit::new(&db, &provider);

        let out = toolkit.run(SqlTool::Query, r#"SELECT COUNT(*) FROM "Artists""#).await;
        assert_eq!(out, "[(3,)]");

        let fenced = "```SQL\nSELECT COUNT(*) FROM \"Albums\"\n```";
        assert_eq!(toolkit.run(SqlTool::Query, fenced).await, "[(4,)]");
    }

    #[tokio::test]
    async fn test_list_and_schema() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new();
        let toolkit = SqlToolkit::new(&db, &provider);

        assert_eq!(toolkit.run(SqlTool::ListTables, "").await, "Albums, Artists, Tracks");

        let schema = toolkit.run(SqlTool::Schema, "Albums, 'Artists'").await;
        assert!(schema.contains("CREATE TABLE Albums"));
        assert!(schema.contains("CREATE TABLE Artists"));

        let missing = toolkit.run(SqlTool::Schema, "Genres").await;
        assert!(missing.starts_with("Error: table_names"));

        assert!(toolkit.run(SqlTool::Schema, " , ").await.starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_query_tool() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new();
        let toolkit = SqlToolkit::new(&db, &provider);

        let call = ToolCall::new("call_0", "sql_db_query", json!({"query": "SELECT COUNT(*) FROM Artists"}));
        let (input, observation) = toolkit.call(&call).await;
        assert_eq!(input, "SELECT COUNT(*) FROM Artists");
        assert_eq!(observation, "[(3,)]");

        let observation = toolkit.call_named("sql_db_query", "SELECT * FROM Nope").await;
        assert!(observation.starts_with("Error: no such table"));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_query_checker_uses_model() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new()
            .then_text("SELECT COUNT(*) FROM Artists")
            .then_error(ProviderError::Network("connection refused".into()));
        let toolkit = SqlToolkit::new(&db, &provider).with_temperature(Some(0.0));

        let checked = toolkit.run(SqlTool::QueryChecker, "SELECT COUNT(*) FROM Artists").await;
        assert_eq!(checked, "SELECT COUNT(*) FROM Artists");

        let requests = provider.requests();
        assert_eq!(requests[0].temperature, Some(0.0));
        let prompt = requests[0].messages[0].content.as_deref().unwrap();
        assert!(prompt.starts_with("SELECT COUNT(*) FROM Artists\nDouble check the sqlite query"));

        let failed = toolkit.run(SqlTool::QueryChecker, "SELECT 1").await;
        assert_eq!(failed, "Error: Network error: connection refused");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_an_observation() {
        let (_dir, db) = seeded();
        let provider = ScriptedProvider::new();
        let toolkit = SqlToolkit::new(&db, &provider);

        let call = ToolCall::new("call_0", "sql_db_drop", json!({}));
        let (_, observation) = toolkit.call(&call).await;
        assert_eq!(
            observation,
            "sql_db_drop is not a valid tool, try one of \
             [sql_db_query, sql_db_schema, sql_db_list_tables, sql_db_query_checker]."
        );
    }
}
