//! Tool-level tests for geo-post-mcp, against an in-memory store

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use std::sync::Arc;

    use mcp_common::{CallToolResult, EmbeddableError, EmbeddableMcp};
    use rmcp::model::{ErrorCode, RawContent};
    use serde_json::{json, Value as JsonValue};

    use super::super::config::Settings;
    use super::super::context::Gateway;
    use super::super::server::GeoPostMcpServer;
    use super::super::store::memory::{MemoryStore, MemoryTable};
    use super::super::types::Value;

    fn settings(allowed: &[&str], max_row_limit: usize) -> Settings {
        Settings {
            host: "localhost".to_string(),
            port: 5432,
            user: "gis".to_string(),
            dbname: "gisdb".to_string(),
            schema: "public".to_string(),
            allowed_tables: allowed.iter().map(|t| t.to_string()).collect(),
            statement_timeout_secs: 30,
            max_row_limit,
            max_connections: 1,
        }
    }

    fn parcels() -> MemoryTable {
        MemoryTable::new("public", "parcels")
            .column("gid", "integer", "int4", false)
            .column("name", "text", "text", true)
            .geometry("geom", "Polygon", 4326)
            .comment("gid", "Unique parcel identifier")
            .comment("geom", "Parcel boundary")
            .row(vec![
                Value::from(1),
                Value::from("Park A"),
                Value::from("0103000020e6100000"),
            ])
            .row(vec![
                Value::from(2),
                Value::from("Park B"),
                Value::from(r#"{"type":"Polygon","coordinates":[]}"#),
            ])
            .row(vec![Value::from(3), Value::Null, Value::Null])
    }

    fn buildings() -> MemoryTable {
        MemoryTable::new("public", "buildings")
            .column("id", "integer", "int4", false)
            .column("height_m", "double precision", "float8", true)
            .row(vec![Value::from(10), Value::float(12.5)])
            .estimated_rows(40)
    }

    fn restricted() -> MemoryTable {
        MemoryTable::new("public", "restricted_table").column("secret", "text", "text", true)
    }

    fn build(store: MemoryStore, allowed: &[&str]) -> (GeoPostMcpServer, Arc<MemoryStore>) {
        let store = Arc::new(store);
        let gateway = Gateway::new(settings(allowed, 10_000), store.clone());
        (GeoPostMcpServer::new(gateway), store)
    }

    fn default_server() -> (GeoPostMcpServer, Arc<MemoryStore>) {
        build(
            MemoryStore::new()
                .with_table(parcels())
                .with_table(buildings())
                .with_table(restricted()),
            &["parcels", "buildings", "phantom"],
        )
    }

    fn json_body(result: &CallToolResult) -> JsonValue {
        let content = result.content.first().expect("tool returned no content");
        if let RawContent::Text(t) = &content.raw {
            serde_json::from_str(&t.text).expect("tool output is not JSON")
        } else {
            panic!("expected text content");
        }
    }

    fn error_code(err: EmbeddableError) -> (ErrorCode, String) {
        match err {
            EmbeddableError::McpError(e) => (e.code, e.message.to_string()),
            other => panic!("expected MCP error, got {other}"),
        }
    }

    // ========================================================================
    // Server surface
    // ========================================================================

    #[test]
    fn test_lists_four_tools() {
        let (server, _) = default_server();
        assert_eq!(server.server_name(), "geo-post");

        let mut names: Vec<String> = server
            .list_tools()
            .iter()
            .map(|t| t.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["describe_table", "fieldmeaning", "list_tables", "query"]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (server, _) = default_server();
        let err = server.call_tool("drop_table", json!({})).await.unwrap_err();
        assert!(matches!(err, EmbeddableError::ToolNotFound(name) if name == "drop_table"));
    }

    // ========================================================================
    // query
    // ========================================================================

    #[tokio::test]
    async fn test_query_returns_shaped_rows() {
        let (server, _) = default_server();
        let result = server
            .call_tool("query", json!({"sql": "SELECT * FROM parcels"}))
            .await
            .unwrap();

        let body = json_body(&result);
        assert_eq!(body["columns"], json!(["gid", "name", "geom"]));
        assert_eq!(body["row_count"], 3);
        assert_eq!(body["truncated"], false);
        assert!(body.get("message").is_none());
        assert_eq!(body["rows"][0], json!([1, "Park A", "0103000020e6100000"]));
        assert_eq!(
            body["rows"][1][2],
            json!(r#"{"type":"Polygon","coordinates":[]}"#)
        );
        assert_eq!(body["rows"][2], json!([3, null, null]));
    }

    #[tokio::test]
    async fn test_query_truncation_message() {
        let (server, _) = default_server();
        let result = server
            .call_tool("query", json!({"sql": "SELECT * FROM parcels", "row_limit": 2}))
            .await
            .unwrap();

        let body = json_body(&result);
        assert_eq!(body["row_count"], 2);
        assert_eq!(body["rows"].as_array().unwrap().len(), 2);
        assert_eq!(body["truncated"], true);
        assert_eq!(body["message"], "Results truncated to 2 rows.");
    }

    #[tokio::test]
    async fn test_query_row_limit_clamped_to_max() {
        let store = Arc::new(MemoryStore::new().with_table(parcels()));
        let gateway = Gateway::new(settings(&["parcels"], 1), store);
        let server = GeoPostMcpServer::new(gateway);

        let result = server
            .call_tool("query", json!({"sql": "SELECT * FROM parcels", "row_limit": 500}))
            .await
            .unwrap();

        let body = json_body(&result);
        assert_eq!(body["row_count"], 1);
        assert_eq!(body["message"], "Results truncated to 1 rows.");
    }

    #[tokio::test]
    async fn test_query_row_limit_must_be_positive() {
        let (server, store) = default_server();
        for limit in [0, -5] {
            let err = server
                .call_tool("query", json!({"sql": "SELECT * FROM parcels", "row_limit": limit}))
                .await
                .unwrap_err();
            let (code, message) = error_code(err);
            assert_eq!(code, ErrorCode::INVALID_PARAMS);
            assert!(message.contains("row_limit"), "{message}");
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_restricted_table_denied() {
        let (server, store) = default_server();

        // Denied whether the table exists or not
        for sql in [
            "SELECT * FROM restricted_table",
            "SELECT * FROM no_such_table",
            "SELECT p.name FROM parcels p JOIN restricted_table r ON r.secret = p.name",
        ] {
            let err = server
                .call_tool("query", json!({"sql": sql}))
                .await
                .unwrap_err();
            let (code, message) = error_code(err);
            assert_eq!(code, ErrorCode::INVALID_REQUEST);
            assert!(message.starts_with("Access denied: table '"), "{message}");
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_select_list_alias_does_not_hide_table() {
        let (server, store) = build(
            MemoryStore::new().with_table(parcels()).with_table(restricted()),
            &["parcels"],
        );

        let err = server
            .call_tool(
                "query",
                json!({"sql": "SELECT secret, restricted_table AS r FROM restricted_table"}),
            )
            .await
            .unwrap_err();
        let (code, message) = error_code(err);
        assert_eq!(code, ErrorCode::INVALID_REQUEST);
        assert_eq!(
            message,
            "Access denied: table 'restricted_table' is not in the allowed tables list."
        );
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_rejects_writes() {
        let (server, store) = default_server();
        let err = server
            .call_tool("query", json!({"sql": "DELETE FROM parcels"}))
            .await
            .unwrap_err();
        let (code, message) = error_code(err);
        assert_eq!(code, ErrorCode::INVALID_PARAMS);
        assert_eq!(
            message,
            "Only SELECT queries are permitted. Received statement starting with: DELETE"
        );

        let err = server
            .call_tool("query", json!({"sql": "  -- nothing here\n"}))
            .await
            .unwrap_err();
        assert_eq!(error_code(err).1, "Empty SQL statement.");

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_query_cte_alias_not_checked() {
        let (server, _) = default_server();
        let result = server
            .call_tool(
                "query",
                json!({"sql": "WITH parks AS (SELECT * FROM parcels) SELECT name FROM parks"}),
            )
            .await
            .unwrap();
        assert_eq!(json_body(&result)["row_count"], 3);
    }

    #[tokio::test]
    async fn test_query_without_tables() {
        let (server, _) = default_server();
        let result = server
            .call_tool("query", json!({"sql": "/* health check */ SELECT 1"}))
            .await
            .unwrap();
        let body = json_body(&result);
        assert_eq!(body["columns"], json!(["?column?"]));
        assert_eq!(body["rows"], json!([[1]]));
    }

    #[tokio::test]
    async fn test_query_store_failure_is_internal_error() {
        let (server, _) = build(MemoryStore::new().failing("server closed the connection"), &["parcels"]);
        let err = server
            .call_tool("query", json!({"sql": "SELECT * FROM parcels"}))
            .await
            .unwrap_err();
        let (code, message) = error_code(err);
        assert_eq!(code, ErrorCode::INTERNAL_ERROR);
        assert!(message.contains("server closed the connection"), "{message}");
    }

    // ========================================================================
    // list_tables / describe_table
    // ========================================================================

    #[tokio::test]
    async fn test_list_tables_only_allowed() {
        let (server, _) = default_server();
        let result = server.call_tool("list_tables", json!({})).await.unwrap();

        assert_eq!(
            json_body(&result),
            json!([
                {"table_name": "buildings", "schema": "public", "estimated_rows": 40},
                {"table_name": "parcels", "schema": "public", "estimated_rows": 3}
            ])
        );
    }

    #[tokio::test]
    async fn test_list_tables_idempotent() {
        let (server, _) = default_server();
        let first = json_body(&server.call_tool("list_tables", json!({})).await.unwrap());
        let second = json_body(&server.call_tool("list_tables", json!({})).await.unwrap());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_describe_geometry_column() {
        let (server, _) = default_server();
        let result = server
            .call_tool("describe_table", json!({"table_name": "parcels"}))
            .await
            .unwrap();

        let body = json_body(&result);
        let columns = body.as_array().unwrap();
        assert_eq!(columns.len(), 3);

        let gid = &columns[0];
        assert_eq!(gid["column_name"], "gid");
        assert_eq!(gid["is_nullable"], false);
        assert!(gid.get("srid").is_none());

        let geom = columns.iter().find(|c| c["column_name"] == "geom").unwrap();
        assert_eq!(geom["geometry_type"], "Polygon");
        assert_eq!(geom["srid"], 4326);
        assert_eq!(geom["coord_dimension"], 2);
        assert_eq!(geom["udt_name"], "geometry");
    }

    #[tokio::test]
    async fn test_describe_denied_and_missing() {
        let (server, store) = default_server();

        let err = server
            .call_tool("describe_table", json!({"table_name": "restricted_table"}))
            .await
            .unwrap_err();
        assert_eq!(error_code(err).0, ErrorCode::INVALID_REQUEST);
        assert_eq!(store.calls(), 0);

        // Allowed but absent from the schema
        let err = server
            .call_tool("describe_table", json!({"table_name": "phantom"}))
            .await
            .unwrap_err();
        let (code, message) = error_code(err);
        assert_eq!(code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(message, "Table 'phantom' does not exist in schema 'public'.");
    }

    // ========================================================================
    // fieldmeaning
    // ========================================================================

    #[tokio::test]
    async fn test_fieldmeaning_returns_comments() {
        let (server, _) = default_server();
        let result = server
            .call_tool("fieldmeaning", json!({"table_name": "parcels"}))
            .await
            .unwrap();

        let body = json_body(&result);
        assert_eq!(body["table"], "parcels");
        assert_eq!(body["schema"], "public");
        assert_eq!(
            body["columns"],
            json!([
                {"column_name": "gid", "data_type": "integer", "ordinal_position": 1, "description": "Unique parcel identifier"},
                {"column_name": "name", "data_type": "text", "ordinal_position": 2, "description": null},
                {"column_name": "geom", "data_type": "USER-DEFINED", "ordinal_position": 3, "description": "Parcel boundary"}
            ])
        );
    }

    #[tokio::test]
    async fn test_fieldmeaning_qualified_name_before_store_access() {
        let (server, store) = default_server();

        for name in ["public.parcels", ""] {
            let err = server
                .call_tool("fieldmeaning", json!({"table_name": name}))
                .await
                .unwrap_err();
            assert_eq!(error_code(err).0, ErrorCode::INVALID_PARAMS);
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_fieldmeaning_denied_and_missing() {
        let (server, _) = default_server();

        let err = server
            .call_tool("fieldmeaning", json!({"table_name": "restricted_table"}))
            .await
            .unwrap_err();
        assert_eq!(error_code(err).0, ErrorCode::INVALID_REQUEST);

        let err = server
            .call_tool("fieldmeaning", json!({"table_name": "phantom"}))
            .await
            .unwrap_err();
        assert_eq!(error_code(err).0, ErrorCode::RESOURCE_NOT_FOUND);
    }
}
