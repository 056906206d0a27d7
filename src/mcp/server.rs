use super::protocol::{
    error_codes, InitializeParams, InitializeResult, JsonRpcRequest, JsonRpcResponse,
    ServerCapabilities, ServerInfo, ToolCallParams, ToolCallResult, ToolsCapability,
    ToolsListResult,
};
use super::tools::{
    workflow_tools, COMPLETE_PHASE, GET_CURRENT_PHASE, GET_WORKFLOW_STATUS, RESET_WORKFLOW,
    START_WORKFLOW,
};
use crate::errors::WorkflowError;
use crate::logging::{AuditLogger, ProtocolDirection, ProtocolInfo, TimingInfo};
use crate::orchestration::PhaseOrchestrator;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const SERVER_NAME: &str = "devflow";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP server exposing the workflow tools over newline-delimited JSON-RPC.
pub struct McpWorkflowServer {
    orchestrator: Arc<PhaseOrchestrator>,
    logger: Arc<AuditLogger>,
}

impl McpWorkflowServer {
    pub fn new(orchestrator: Arc<PhaseOrchestrator>, logger: Arc<AuditLogger>) -> Self {
        Self {
            orchestrator,
            logger,
        }
    }

    /// Serves requests until `reader` reaches EOF.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines
            .next_line()
            .await
            .context("Failed to read from MCP input")?
        {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line) {
                let json = serde_json::to_string(&response)?;
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        tracing::debug!("MCP input closed");
        Ok(())
    }

    /// Handle a single JSON-RPC message
    pub fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        let started = Utc::now();
        let request: JsonRpcRequest = match serde_json::from_str(message) {
            Ok(req) => req,
            Err(e) => {
                let response = JsonRpcResponse::error(
                    None,
                    error_codes::PARSE_ERROR,
                    format!("Failed to parse request: {}", e),
                );
                self.log_response("parse_error", &response, started);
                return Some(response);
            }
        };

        let direction = if request.is_notification() {
            ProtocolDirection::Notification
        } else {
            ProtocolDirection::Request
        };
        self.logger.log_protocol(
            ProtocolInfo {
                direction,
                method: request.method.clone(),
                id: request.id.clone(),
                payload: request.params.clone(),
            },
            None,
        );

        // Handle notifications (no id) - don't send response
        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.params),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tool_call(request.params),
            _ => Err((
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        let response = match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err((code, message)) => JsonRpcResponse::error(request.id, code, message),
        };
        self.log_response(&request.method, &response, started);
        Some(response)
    }

    fn log_response(&self, method: &str, response: &JsonRpcResponse, started: DateTime<Utc>) {
        self.logger.log_protocol(
            ProtocolInfo {
                direction: ProtocolDirection::Response,
                method: method.to_string(),
                id: response.id.clone(),
                payload: serde_json::to_value(response).ok(),
            },
            Some(TimingInfo::between(started, Utc::now())),
        );
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        if request.method != "notifications/initialized" {
            tracing::debug!("Ignoring notification {}", request.method);
        }
    }

    fn handle_initialize(&self, params: Option<Value>) -> Result<Value, (i32, String)> {
        if let Some(params) = params {
            serde_json::from_value::<InitializeParams>(params).map_err(|e| {
                (
                    error_codes::INVALID_PARAMS,
                    format!("Invalid initialize params: {}", e),
                )
            })?;
        }

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME,
                version: SERVER_VERSION,
            },
        };

        serde_json::to_value(result)
            .map_err(|e| (error_codes::INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    fn handle_tools_list(&self) -> Result<Value, (i32, String)> {
        let result = ToolsListResult {
            tools: workflow_tools(),
        };
        serde_json::to_value(result)
            .map_err(|e| (error_codes::INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    fn handle_tool_call(&self, params: Option<Value>) -> Result<Value, (i32, String)> {
        let call_params: ToolCallParams = params
            .ok_or((error_codes::INVALID_PARAMS, "Missing params".to_string()))
            .and_then(|p| {
                serde_json::from_value(p).map_err(|e| {
                    (
                        error_codes::INVALID_PARAMS,
                        format!("Invalid tool call params: {}", e),
                    )
                })
            })?;

        let result = self.call_tool(&call_params.name, call_params.arguments);
        serde_json::to_value(result)
            .map_err(|e| (error_codes::INTERNAL_ERROR, format!("Serialization error: {}", e)))
    }

    fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult {
        let outcome = match name {
            START_WORKFLOW => self.orchestrator.start_workflow_json(arguments),
            COMPLETE_PHASE => self.orchestrator.complete_phase_json(arguments),
            GET_CURRENT_PHASE => Ok(self.orchestrator.get_current_phase()),
            GET_WORKFLOW_STATUS => Ok(self.orchestrator.get_workflow_status()),
            RESET_WORKFLOW => Ok(self.orchestrator.reset_workflow()),
            _ => return ToolCallResult::error(format!("Unknown tool: {}", name)),
        };
        match outcome {
            Ok(text) => ToolCallResult::text(text),
            Err(e) => ToolCallResult::error(tool_error_text(&e)),
        }
    }
}

fn tool_error_text(error: &WorkflowError) -> String {
    format!("{}: {}", error.kind(), error)
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
