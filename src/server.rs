//! MCP server exposing trivia sessions as tools.

use crate::registry::{SessionFilter, SessionRegistry};
use crate::trivia::{SessionError, SessionSettings};
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};

/// Request for registering a connection as a named player.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RegisterPlayerRequest {
    /// Caller's connection id.
    pub connection_id: String,
    /// Display name.
    pub name: String,
}

/// Request identifying a connection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConnectionRequest {
    /// Caller's connection id.
    pub connection_id: String,
}

/// Request for creating a session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CreateSessionRequest {
    /// Creator's connection id; becomes host.
    pub connection_id: String,
    /// Session name, unique among live sessions.
    pub name: String,
    /// Requested number of rounds.
    pub rounds: u32,
    /// Host password.
    pub password: String,
    /// Contestant join code.
    pub code: String,
    /// Question set identifier.
    pub question_set: String,
}

/// Request for joining a session as a contestant.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinSessionRequest {
    /// Session to join.
    pub session_id: String,
    /// Contestant join code.
    pub code: String,
    /// Caller's connection id.
    pub connection_id: String,
}

/// Request for claiming the host slot.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JoinHostRequest {
    /// Session to host.
    pub session_id: String,
    /// Host password.
    pub password: String,
    /// Caller's connection id.
    pub connection_id: String,
}

/// Request acting on a session on behalf of a connection.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionActionRequest {
    /// Target session.
    pub session_id: String,
    /// Caller's connection id.
    pub connection_id: String,
}

/// Request naming a session only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionRequest {
    /// Target session.
    pub session_id: String,
}

/// Request for submitting an answer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SubmitAnswerRequest {
    /// Target session.
    pub session_id: String,
    /// Answering player's connection id.
    pub player_id: String,
    /// Answer text.
    pub answer: String,
}

/// Request targeting one player of a session.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlayerRequest {
    /// Target session.
    pub session_id: String,
    /// Target player.
    pub player_id: String,
}

/// Request for listing sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListSessionsRequest {
    /// `available` for joinable sessions, `active` for all non-ended ones.
    #[serde(default)]
    pub filter: SessionFilter,
}

/// Main server handler.
pub struct TriviaServer {
    registry: SessionRegistry,
    tool_router: ToolRouter<Self>,
}

fn rejected(e: SessionError) -> McpError {
    McpError::invalid_params(e.to_string(), None)
}

fn json_result(value: serde_json::Value) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(&value).map_err(|e| {
        error!(error = %e, "Failed to encode tool response");
        McpError::internal_error(e.to_string(), None)
    })?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl TriviaServer {
    /// Creates a trivia server sharing `registry` with other handlers.
    #[instrument(skip(registry))]
    pub fn with_registry(registry: SessionRegistry) -> Self {
        info!("Creating trivia server with shared registry");
        Self {
            registry,
            tool_router: Self::tool_router(),
        }
    }

    /// Registry backing this server.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Registers a connection as a named player.
    #[instrument(skip(self, req), fields(connection_id = %req.connection_id, name = %req.name))]
    #[tool(description = "Register a connection under a display name. Reconnects a disconnected player with the same name.")]
    pub async fn register_player(
        &self,
        Parameters(req): Parameters<RegisterPlayerRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .registry
            .players()
            .connect(&req.connection_id, &req.name)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "data": outcome }))
    }

    /// Drops a connection from every session it belongs to.
    #[instrument(skip(self, req), fields(connection_id = %req.connection_id))]
    #[tool(description = "Report that a connection went away. Hosts lose the host slot, contestants are marked disconnected.")]
    pub async fn disconnect(
        &self,
        Parameters(req): Parameters<ConnectionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let sessions = self.registry.disconnect(&req.connection_id).await;
        json_result(json!({ "success": true, "sessions": sessions }))
    }

    /// Creates a session hosted by the caller.
    #[instrument(skip(self, req), fields(name = %req.name, question_set = %req.question_set))]
    #[tool(description = "Create a trivia session. The caller becomes its host.")]
    pub async fn create_session(
        &self,
        Parameters(req): Parameters<CreateSessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let settings = SessionSettings::new(
            req.name,
            req.rounds,
            req.password,
            req.code,
            req.question_set,
            Some(req.connection_id),
        );
        let session_id = self
            .registry
            .create_session(settings)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "sessionId": session_id }))
    }

    /// Joins a session as a contestant.
    #[instrument(skip(self, req), fields(session_id = %req.session_id, connection_id = %req.connection_id))]
    #[tool(description = "Join a session as a contestant using its join code.")]
    pub async fn join_session(
        &self,
        Parameters(req): Parameters<JoinSessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let players = self
            .registry
            .join_session(&req.session_id, &req.code, &req.connection_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "players": players }))
    }

    /// Claims the host slot of a session.
    #[instrument(skip(self, req), fields(session_id = %req.session_id, connection_id = %req.connection_id))]
    #[tool(description = "Claim the host slot of a session using its password.")]
    pub async fn join_host(
        &self,
        Parameters(req): Parameters<JoinHostRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.registry
            .join_host(&req.session_id, &req.password, &req.connection_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "sessionId": req.session_id }))
    }

    /// Starts a session and returns the first round for the host.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    #[tool(description = "Start a session (needs at least 2 players). Returns the first full question for the host; contestants receive the trimmed question.")]
    pub async fn start_session(
        &self,
        Parameters(req): Parameters<SessionActionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .registry
            .start_session(&req.session_id, &req.connection_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "data": outcome }))
    }

    /// Advances to the next round.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    #[tool(description = "Reveal the next round, or end the session when no questions remain.")]
    pub async fn next_round(
        &self,
        Parameters(req): Parameters<SessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .registry
            .next_round(&req.session_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "data": outcome }))
    }

    /// Starts the answer countdown.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    #[tool(description = "Start the answer countdown; answers close when it elapses.")]
    pub async fn start_countdown(
        &self,
        Parameters(req): Parameters<SessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let round = self
            .registry
            .start_countdown(&req.session_id)
            .await
            .map_err(rejected)?;
        let window_ms = u64::try_from(self.registry.answer_window().as_millis()).unwrap_or(u64::MAX);
        json_result(json!({ "success": true, "round": round, "windowMs": window_ms }))
    }

    /// Submits an answer for the current round.
    #[instrument(skip(self, req), fields(session_id = %req.session_id, player_id = %req.player_id))]
    #[tool(description = "Submit an answer for the current round. Only the first answer per round counts.")]
    pub async fn submit_answer(
        &self,
        Parameters(req): Parameters<SubmitAnswerRequest>,
    ) -> Result<CallToolResult, McpError> {
        let accepted = match self
            .registry
            .submit_answer(&req.session_id, &req.player_id, &req.answer)
            .await
        {
            Ok(_) => true,
            Err(e @ SessionError::SessionNotFound { .. }) => return Err(rejected(e)),
            Err(e) => {
                warn!(error = %e, "Answer not accepted");
                false
            }
        };
        json_result(json!({ "accepted": accepted }))
    }

    /// Reveals the current round's answer.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    #[tool(description = "Reveal the correct answer and explanation for the current round.")]
    pub async fn reveal_answer(
        &self,
        Parameters(req): Parameters<SessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let reveal = self
            .registry
            .reveal_answer(&req.session_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "data": reveal }))
    }

    /// Returns the scoreboard.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    #[tool(description = "Get the session's players ranked by score.")]
    pub async fn reveal_scores(
        &self,
        Parameters(req): Parameters<SessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let standings = self
            .registry
            .reveal_scores(&req.session_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "data": standings }))
    }

    /// Ejects a player.
    #[instrument(skip(self, req), fields(session_id = %req.session_id, player_id = %req.player_id))]
    #[tool(description = "Remove a player from a session permanently.")]
    pub async fn remove_player(
        &self,
        Parameters(req): Parameters<PlayerRequest>,
    ) -> Result<CallToolResult, McpError> {
        let players = self
            .registry
            .remove_player(&req.session_id, &req.player_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "players": players }))
    }

    /// Leaves a session, keeping the seat for a reconnect.
    #[instrument(skip(self, req), fields(session_id = %req.session_id, player_id = %req.player_id))]
    #[tool(description = "Leave a session. The seat and score are kept for a later reconnect.")]
    pub async fn leave_session(
        &self,
        Parameters(req): Parameters<PlayerRequest>,
    ) -> Result<CallToolResult, McpError> {
        let players = self
            .registry
            .leave_session(&req.session_id, &req.player_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "players": players }))
    }

    /// Ends a running session.
    #[instrument(skip(self, req), fields(session_id = %req.session_id))]
    #[tool(description = "End a running session and return the final standings.")]
    pub async fn finish_session(
        &self,
        Parameters(req): Parameters<SessionRequest>,
    ) -> Result<CallToolResult, McpError> {
        let standings = self
            .registry
            .finish_session(&req.session_id)
            .await
            .map_err(rejected)?;
        json_result(json!({ "success": true, "data": standings }))
    }

    /// Lists sessions.
    #[instrument(skip(self, req), fields(filter = ?req.filter))]
    #[tool(description = "List sessions: 'available' for joinable ones, 'active' for all that have not ended.")]
    pub async fn list_sessions(
        &self,
        Parameters(req): Parameters<ListSessionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        let sessions = self.registry.list_sessions(req.filter).await;
        json_result(json!(sessions))
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for TriviaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Live multiplayer trivia server".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
