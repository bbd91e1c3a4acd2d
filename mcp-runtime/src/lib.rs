//! MCP runtime for Tassel: a JSON-RPC 2.0 server over stdio exposing the
//! Canvas aggregation core as agent tools. Credential resolution happens
//! here, at the boundary — the core only ever sees resolved credentials.

use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::{Map, Value, json};
use tokio::io::{self, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use tassel_core::canvas::CanvasClient;
use tassel_core::error::CanvasError;
use tassel_core::{discussions, grades, planner};

pub mod util;

use util::{StoredCredentials, resolve_credentials, save_credentials};

const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
const MCP_SERVER_NAME: &str = "tassel-mcp";

#[derive(Debug, Subcommand)]
pub enum McpCommands {
    /// Serve MCP over stdio
    Serve(ServeArgs),
    /// Probe the Canvas connection and report readiness
    Diagnose(DiagnoseArgs),
    /// Store Canvas credentials in the user config dir
    Connect(ConnectArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Canvas access token (overrides env and stored config)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Debug, Args)]
pub struct DiagnoseArgs {
    /// Canvas access token (overrides env and stored config)
    #[arg(long)]
    pub token: Option<String>,
}

#[derive(Debug, Args)]
pub struct ConnectArgs {
    /// Canvas base URL, e.g. school.instructure.com
    #[arg(long)]
    pub base_url: String,

    /// Canvas access token (Account → Settings → New Access Token)
    #[arg(long)]
    pub token: String,
}

pub async fn run(canvas_url: Option<String>, command: McpCommands) -> i32 {
    match command {
        McpCommands::Serve(args) => {
            let server = McpServer::new(canvas_url, args.token);
            match server.serve_stdio().await {
                Ok(()) => 0,
                Err(err) => {
                    let payload = json!({
                        "error": "mcp_server_error",
                        "message": err,
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    1
                }
            }
        }
        McpCommands::Diagnose(args) => {
            let (report, code) = run_diagnose(canvas_url, args.token).await;
            println!("{}", to_pretty_json(&report));
            code
        }
        McpCommands::Connect(args) => {
            let creds = StoredCredentials {
                base_url: args.base_url,
                access_token: args.token,
            };
            match save_credentials(&creds) {
                Ok(()) => {
                    let payload = json!({
                        "status": "saved",
                        "path": util::config_path(),
                    });
                    println!("{}", to_pretty_json(&payload));
                    0
                }
                Err(err) => {
                    let payload = json!({
                        "error": "config_write_failed",
                        "message": err.to_string(),
                    });
                    eprintln!("{}", to_pretty_json(&payload));
                    1
                }
            }
        }
    }
}

/// Credential probe used by `tassel-mcp diagnose`. Exit code 2 signals
/// "not ready" distinctly from transport failure.
async fn run_diagnose(canvas_url: Option<String>, token: Option<String>) -> (Value, i32) {
    let Some(credentials) = resolve_credentials(canvas_url, token) else {
        return (
            json!({
                "status": "not_connected",
                "error": "not_connected",
                "message": "No Canvas credentials found",
                "docs_hint": "Run `tassel-mcp connect`, set TASSEL_CANVAS_URL and TASSEL_CANVAS_TOKEN, or pass --token.",
            }),
            2,
        );
    };

    let client = match CanvasClient::new(&credentials) {
        Ok(client) => client,
        Err(err) => {
            return (
                json!({
                    "status": "not_ready",
                    "error": "invalid_base_url",
                    "message": err.to_string(),
                }),
                2,
            );
        }
    };

    match client.fetch_user_profile().await {
        Ok(profile) => (
            json!({
                "status": "ready",
                "base_url": credentials.base_url,
                "user": { "id": profile.id, "name": profile.name },
                "checked_at": Utc::now(),
            }),
            0,
        ),
        Err(CanvasError::Upstream { status: 401, .. }) => (
            json!({
                "status": "not_ready",
                "error": "invalid_credentials",
                "message": "Canvas rejected the access token",
                "docs_hint": "Generate a new token in Canvas under Account → Settings → New Access Token.",
            }),
            2,
        ),
        Err(err) => (
            json!({
                "status": "not_ready",
                "error": "canvas_unreachable",
                "message": err.to_string(),
            }),
            2,
        ),
    }
}

struct McpServer {
    canvas_url: Option<String>,
    explicit_token: Option<String>,
}

impl McpServer {
    fn new(canvas_url: Option<String>, explicit_token: Option<String>) -> Self {
        Self {
            canvas_url,
            explicit_token,
        }
    }

    /// Resolve credentials per call so a `connect` run mid-session takes
    /// effect without restarting the server.
    fn client(&self) -> Result<CanvasClient, ToolError> {
        let credentials =
            resolve_credentials(self.canvas_url.clone(), self.explicit_token.clone()).ok_or_else(
                || {
                    ToolError::new("not_connected", "No Canvas credentials found").with_docs_hint(
                        "Run `tassel-mcp connect`, set TASSEL_CANVAS_URL and TASSEL_CANVAS_TOKEN, or pass --token.",
                    )
                },
            )?;

        CanvasClient::new(&credentials).map_err(|err| {
            ToolError::new("invalid_base_url", err.to_string()).with_field("base_url")
        })
    }

    async fn serve_stdio(&self) -> Result<(), String> {
        let stdin = io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = io::stdout();

        loop {
            let incoming = read_framed_json(&mut reader)
                .await
                .map_err(|e| format!("Failed to read MCP message: {e}"))?;
            let Some(incoming) = incoming else {
                break;
            };

            let responses = self.handle_incoming_message(incoming).await;
            for response in responses {
                write_framed_json(&mut stdout, &response)
                    .await
                    .map_err(|e| format!("Failed to write MCP response: {e}"))?;
            }
        }

        Ok(())
    }

    async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // Most likely a client response; this server issues no outbound requests.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        if let Some(id) = obj.get("id").cloned() {
            let result = self.handle_request(method, params).await;
            Some(match result {
                Ok(payload) => success_response(id, payload),
                Err(err) => error_response(id, err),
            })
        } else {
            self.handle_notification(method, params).await;
            None
        }
    }

    async fn handle_notification(&self, method: &str, _params: Value) {
        if matches!(
            method,
            "notifications/initialized" | "notifications/cancelled"
        ) {
            return;
        }
        // Unknown notifications are intentionally ignored.
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            "prompts/list" => Ok(json!({ "prompts": [] })),
            "resources/list" => Ok(json!({ "resources": [] })),
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    fn initialize_payload(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": {
                    "listChanged": false
                },
                "resources": {
                    "listChanged": false
                },
                "prompts": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": MCP_SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "Start with canvas_connection_status to confirm credentials. canvas_study_plan and canvas_discussion_insights aggregate across all active courses; canvas_course_grades needs a course_id from canvas_list_courses. Results are live Canvas reads — nothing is cached between calls."
        })
    }

    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let args = match params.get("arguments") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call 'arguments' must be an object",
                ));
            }
        };

        Ok(match self.execute_tool(name, &args).await {
            Ok(payload) => build_tool_call_response(
                json!({ "status": "ok", "tool": name, "data": payload }),
                false,
            ),
            Err(err) => build_tool_call_response(
                json!({ "status": "error", "tool": name, "error": err.to_value() }),
                true,
            ),
        })
    }

    async fn execute_tool(
        &self,
        tool_name: &str,
        args: &Map<String, Value>,
    ) -> Result<Value, ToolError> {
        match tool_name {
            "canvas_connection_status" => self.tool_connection_status().await,
            "canvas_list_courses" => self.tool_list_courses().await,
            "canvas_course_grades" => self.tool_course_grades(args).await,
            "canvas_study_plan" => self.tool_study_plan().await,
            "canvas_discussion_insights" => self.tool_discussion_insights().await,
            "canvas_upcoming" => self.tool_upcoming().await,
            "canvas_course_files" => self.tool_course_files(args).await,
            other => Err(ToolError::new(
                "unknown_tool",
                format!("Unknown tool: {other}"),
            )),
        }
    }

    async fn tool_connection_status(&self) -> Result<Value, ToolError> {
        let client = self.client()?;
        match client.fetch_user_profile().await {
            Ok(profile) => Ok(json!({
                "connected": true,
                "user": { "id": profile.id, "name": profile.name },
            })),
            Err(CanvasError::Upstream { status: 401, .. }) => Err(ToolError::new(
                "invalid_credentials",
                "Canvas rejected the access token",
            )
            .with_docs_hint(
                "Generate a new token in Canvas under Account → Settings → New Access Token.",
            )),
            Err(err) => Err(tool_error_from_canvas(err)),
        }
    }

    async fn tool_list_courses(&self) -> Result<Value, ToolError> {
        let client = self.client()?;
        let courses = client
            .fetch_courses()
            .await
            .map_err(tool_error_from_canvas)?;
        to_tool_value(&courses)
    }

    async fn tool_course_grades(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let course_id = require_u64(args, "course_id")?;
        let client = self.client()?;
        let summary = grades::course_grade_report(&client, course_id)
            .await
            .map_err(tool_error_from_canvas)?;
        to_tool_value(&summary)
    }

    async fn tool_study_plan(&self) -> Result<Value, ToolError> {
        let client = self.client()?;
        let plan = planner::study_plan(&client, Utc::now())
            .await
            .map_err(tool_error_from_canvas)?;
        to_tool_value(&plan)
    }

    async fn tool_discussion_insights(&self) -> Result<Value, ToolError> {
        let client = self.client()?;
        let insights = discussions::discussion_insights(&client, Utc::now())
            .await
            .map_err(tool_error_from_canvas)?;
        to_tool_value(&insights)
    }

    async fn tool_upcoming(&self) -> Result<Value, ToolError> {
        let client = self.client()?;
        let courses = client
            .fetch_courses()
            .await
            .map_err(tool_error_from_canvas)?;

        let (events, announcements) = tokio::join!(
            client.fetch_calendar_events(),
            client.fetch_announcements(&courses),
        );
        let mut events = events.map_err(tool_error_from_canvas)?;
        let mut announcements = announcements.map_err(tool_error_from_canvas)?;

        events.sort_by(|a, b| a.start_at.cmp(&b.start_at));
        announcements.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));

        Ok(json!({
            "calendar_events": events,
            "announcements": announcements,
        }))
    }

    async fn tool_course_files(&self, args: &Map<String, Value>) -> Result<Value, ToolError> {
        let course_id = require_u64(args, "course_id")?;
        let client = self.client()?;
        let mut files = client
            .fetch_course_files(course_id)
            .await
            .map_err(tool_error_from_canvas)?;
        files.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        to_tool_value(&files)
    }
}

fn to_tool_value<T: serde::Serialize>(payload: &T) -> Result<Value, ToolError> {
    serde_json::to_value(payload)
        .map_err(|err| ToolError::new("internal_error", err.to_string()))
}

fn require_u64(args: &Map<String, Value>, field: &str) -> Result<u64, ToolError> {
    args.get(field).and_then(Value::as_u64).ok_or_else(|| {
        ToolError::new(
            "invalid_params",
            format!("'{field}' must be a positive integer"),
        )
        .with_field(field)
    })
}

fn tool_error_from_canvas(err: CanvasError) -> ToolError {
    match err {
        CanvasError::Upstream {
            status,
            status_text,
            url,
        } => ToolError::new(
            "upstream_http_error",
            format!("Canvas returned {status} {status_text}"),
        )
        .with_details(json!({
            "status": status,
            "status_text": status_text,
            "url": url,
        })),
        other => ToolError::new("canvas_unreachable", other.to_string()),
    }
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

impl RpcError {
    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {method}"),
            data: None,
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Clone)]
struct ToolError {
    code: String,
    message: String,
    field: Option<String>,
    docs_hint: Option<String>,
    details: Option<Value>,
}

impl ToolError {
    fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            field: None,
            docs_hint: None,
            details: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    fn with_docs_hint(mut self, docs_hint: impl Into<String>) -> Self {
        self.docs_hint = Some(docs_hint.into());
        self
    }

    fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    fn to_value(&self) -> Value {
        let mut payload = json!({
            "error": self.code,
            "message": self.message
        });
        if let Some(field) = &self.field {
            payload["field"] = Value::String(field.clone());
        }
        if let Some(docs_hint) = &self.docs_hint {
            payload["docs_hint"] = Value::String(docs_hint.clone());
        }
        if let Some(details) = &self.details {
            payload["details"] = details.clone();
        }
        payload
    }
}

#[derive(Debug)]
struct ToolDefinition {
    name: &'static str,
    description: &'static str,
    input_schema: Value,
}

fn tool_definitions() -> Vec<ToolDefinition> {
    let no_args = json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    });
    let course_id_arg = json!({
        "type": "object",
        "properties": {
            "course_id": { "type": "integer", "description": "Canvas course id" }
        },
        "required": ["course_id"],
        "additionalProperties": false
    });

    vec![
        ToolDefinition {
            name: "canvas_connection_status",
            description: "Check whether Canvas credentials are configured and still accepted.",
            input_schema: no_args.clone(),
        },
        ToolDefinition {
            name: "canvas_list_courses",
            description: "List the user's active Canvas courses.",
            input_schema: no_args.clone(),
        },
        ToolDefinition {
            name: "canvas_course_grades",
            description: "Per-group grade breakdown, weighted overall grade, and the average score needed on remaining work for each letter grade, for one course.",
            input_schema: course_id_arg.clone(),
        },
        ToolDefinition {
            name: "canvas_study_plan",
            description: "Outstanding assignments across all courses, ranked by urgency and grade impact; overdue work always first.",
            input_schema: no_args.clone(),
        },
        ToolDefinition {
            name: "canvas_discussion_insights",
            description: "Published discussion topics the user has not posted in, bucketed by due date.",
            input_schema: no_args.clone(),
        },
        ToolDefinition {
            name: "canvas_upcoming",
            description: "Upcoming calendar events and recent announcements across all courses.",
            input_schema: no_args,
        },
        ToolDefinition {
            name: "canvas_course_files",
            description: "Files posted in one course.",
            input_schema: course_id_arg,
        },
    ]
}

fn tools_list_payload() -> Value {
    let tools: Vec<Value> = tool_definitions()
        .into_iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema,
            })
        })
        .collect();
    json!({ "tools": tools })
}

fn build_tool_call_response(envelope: Value, is_error: bool) -> Value {
    let text = to_pretty_json(&envelope);

    if is_error {
        json!({
            "isError": true,
            "content": [{ "type": "text", "text": text }],
            "structuredContent": envelope
        })
    } else {
        json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": envelope
        })
    }
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}

async fn read_framed_json(
    reader: &mut BufReader<tokio::io::Stdin>,
) -> Result<Option<Value>, std::io::Error> {
    let mut content_length: Option<usize> = None;

    loop {
        let mut line = String::new();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            if content_length.is_none() {
                return Ok(None);
            }
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Unexpected EOF while reading MCP headers",
            ));
        }

        if line == "\r\n" {
            break;
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.to_ascii_lowercase().starts_with("content-length:") {
            let raw_len = line
                .split_once(':')
                .map(|(_, right)| right.trim())
                .unwrap_or_default();
            let parsed = raw_len.parse::<usize>().map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Invalid Content-Length header",
                )
            })?;
            content_length = Some(parsed);
        }
    }

    let content_length = content_length.ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Missing Content-Length header",
        )
    })?;
    let mut payload = vec![0_u8; content_length];
    reader.read_exact(&mut payload).await?;

    let json: Value = serde_json::from_slice(&payload).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Invalid JSON payload: {e}"),
        )
    })?;
    Ok(Some(json))
}

async fn write_framed_json(
    writer: &mut tokio::io::Stdout,
    value: &Value,
) -> Result<(), std::io::Error> {
    let body = serde_json::to_vec(value).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Failed to serialize JSON: {e}"),
        )
    })?;
    let header = format!(
        "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n",
        body.len()
    );
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
