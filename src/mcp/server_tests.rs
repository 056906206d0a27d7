use super::*;
use crate::logging::{LogEntry, LoggerOptions};
use crate::mcp::protocol::{ToolCallResult, ToolContent};
use crate::state_machine::WorkflowStateMachine;
use tempfile::TempDir;

fn create_test_server() -> (McpWorkflowServer, Arc<AuditLogger>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = Arc::new(AuditLogger::new(LoggerOptions::durable_only(temp_dir.path())));
    let orchestrator = Arc::new(PhaseOrchestrator::new(WorkflowStateMachine::new(
        Arc::clone(&logger),
    )));
    let server = McpWorkflowServer::new(orchestrator, Arc::clone(&logger));
    (server, logger, temp_dir)
}

fn call(server: &McpWorkflowServer, id: u64, tool: &str, arguments: Value) -> ToolCallResult {
    let message = json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": { "name": tool, "arguments": arguments }
    });
    let response = server
        .handle_message(&message.to_string())
        .expect("request should get a response");
    assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
    serde_json::from_value(response.result.unwrap()).unwrap()
}

fn joined_text(result: &ToolCallResult) -> String {
    result
        .content
        .iter()
        .map(|content| match content {
            ToolContent::Text { text } => text.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn read_entries(logger: &AuditLogger) -> Vec<LogEntry> {
    logger.close();
    std::fs::read_to_string(logger.path().unwrap())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_handle_initialize() {
    let (server, _logger, _temp) = create_test_server();
    let params = json!({
        "protocolVersion": "2024-11-05",
        "capabilities": {},
        "clientInfo": {
            "name": "test-client",
            "version": "1.0.0"
        }
    });

    let value = server.handle_initialize(Some(params)).unwrap();
    assert_eq!(value["protocolVersion"], "2024-11-05");
    assert_eq!(value["serverInfo"]["name"], "devflow");
    assert!(value["capabilities"]["tools"].is_object());
}

#[test]
fn test_handle_initialize_invalid_params() {
    let (server, _logger, _temp) = create_test_server();
    let err = server
        .handle_initialize(Some(json!({"protocolVersion": 3})))
        .unwrap_err();
    assert_eq!(err.0, error_codes::INVALID_PARAMS);
}

#[test]
fn test_handle_tools_list() {
    let (server, _logger, _temp) = create_test_server();
    let value = server.handle_tools_list().unwrap();
    let tools = value["tools"].as_array().unwrap();

    let tool_names: Vec<&str> = tools
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        tool_names,
        vec![
            "start_workflow",
            "complete_phase",
            "get_current_phase",
            "get_workflow_status",
            "reset_workflow"
        ]
    );
    assert!(tools[0]["inputSchema"].is_object());
}

#[test]
fn test_ping() {
    let (server, _logger, _temp) = create_test_server();
    let response = server
        .handle_message(r#"{"jsonrpc":"2.0","id":9,"method":"ping"}"#)
        .unwrap();
    assert_eq!(response.result, Some(json!({})));
    assert_eq!(response.id, Some(json!(9)));
}

#[test]
fn test_handle_message_parse_error() {
    let (server, _logger, _temp) = create_test_server();
    let resp = server.handle_message("not valid json").unwrap();
    assert_eq!(resp.error.unwrap().code, error_codes::PARSE_ERROR);
}

#[test]
fn test_handle_message_method_not_found() {
    let (server, _logger, _temp) = create_test_server();
    let msg = r#"{"jsonrpc":"2.0","id":1,"method":"unknown/method"}"#;
    let resp = server.handle_message(msg).unwrap();
    assert_eq!(resp.error.unwrap().code, error_codes::METHOD_NOT_FOUND);
}

#[test]
fn test_tool_call_missing_params() {
    let (server, _logger, _temp) = create_test_server();
    let msg = r#"{"jsonrpc":"2.0","id":1,"method":"tools/call"}"#;
    let resp = server.handle_message(msg).unwrap();
    assert_eq!(resp.error.unwrap().code, error_codes::INVALID_PARAMS);
}

#[test]
fn test_handle_notification_no_response() {
    let (server, _logger, _temp) = create_test_server();
    let msg = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
    assert!(server.handle_message(msg).is_none());
}

#[test]
fn test_unknown_tool_is_tool_error() {
    let (server, _logger, _temp) = create_test_server();
    let result = call(&server, 1, "deploy", json!({}));
    assert!(result.is_error);
    assert!(joined_text(&result).contains("Unknown tool: deploy"));
}

#[test]
fn test_workflow_through_tools() {
    let (server, _logger, _temp) = create_test_server();

    let started = call(&server, 1, START_WORKFLOW, json!({"issueId": "42"}));
    assert!(!started.is_error);
    assert!(joined_text(&started).contains("`issue_start`"));

    let again = call(&server, 2, START_WORKFLOW, json!({"issueId": "43"}));
    assert!(again.is_error);
    assert!(joined_text(&again).starts_with("AlreadyActive:"));

    let completed = call(
        &server,
        3,
        COMPLETE_PHASE,
        json!({
            "phaseName": "issue_start",
            "status": "completed",
            "workingFiles": ["src/a.rs"],
            "completedTasks": ["read issue"],
            "completedAt": "2026-01-15T14:30:00Z"
        }),
    );
    assert!(!completed.is_error);
    assert!(joined_text(&completed).contains("`implementation`"));

    let status = call(&server, 4, GET_WORKFLOW_STATUS, json!({}));
    assert!(joined_text(&status).contains("1/6 phases completed"));
    assert!(joined_text(&status).contains("Working files: 1"));

    let current = call(&server, 5, GET_CURRENT_PHASE, json!({}));
    assert!(joined_text(&current).contains("`implementation`"));

    let reset = call(&server, 6, RESET_WORKFLOW, json!({}));
    assert_eq!(joined_text(&reset), "Workflow for issue 42 has been reset.");
}

#[test]
fn test_mismatch_is_tool_error_naming_both_phases() {
    let (server, _logger, _temp) = create_test_server();
    call(&server, 1, START_WORKFLOW, json!({"issueId": "42"}));
    let result = call(
        &server,
        2,
        COMPLETE_PHASE,
        json!({
            "phaseName": "fix",
            "status": "completed",
            "completedAt": "2026-01-15"
        }),
    );
    assert!(result.is_error);
    let text = joined_text(&result);
    assert!(text.starts_with("PhaseMismatch:"));
    assert!(text.contains("'fix'"));
    assert!(text.contains("'issue_start'"));
}

#[test]
fn test_protocol_exchanges_are_logged_with_timing() {
    let (server, logger, _temp) = create_test_server();
    server.handle_message(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#);
    server.handle_message(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);

    let entries = read_entries(&logger);
    let protocol: Vec<_> = entries.iter().filter_map(|e| e.protocol.as_ref()).collect();
    assert_eq!(protocol.len(), 3);
    assert_eq!(protocol[0].direction, ProtocolDirection::Notification);
    assert_eq!(protocol[1].direction, ProtocolDirection::Request);
    assert_eq!(protocol[2].direction, ProtocolDirection::Response);
    assert_eq!(protocol[2].method, "ping");

    let response_entry = entries
        .iter()
        .find(|e| {
            e.protocol
                .as_ref()
                .is_some_and(|p| p.direction == ProtocolDirection::Response)
        })
        .unwrap();
    let timing = response_entry.timing.as_ref().unwrap();
    assert!(timing.duration_ms >= 0.0);
}

#[tokio::test]
async fn test_run_serves_until_eof() {
    let (server, _logger, _temp) = create_test_server();
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"t","version":"1"}}}"#,
        "\n",
        r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        "\n\n",
        r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"start_workflow","arguments":{"issueId":"42"}}}"#,
        "\n"
    );
    let mut output = Vec::new();

    server.run(input.as_bytes(), &mut output).await.unwrap();

    let responses: Vec<Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0]["id"], json!(1));
    assert_eq!(responses[1]["id"], json!(2));
    assert_eq!(responses[1]["result"]["isError"], false);
}
