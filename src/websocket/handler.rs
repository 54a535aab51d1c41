use std::time::{Duration, Instant};

use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::engine::Color;
use crate::models::{AppState, ChessWebSocketMessage, ClientMessage, GameSnapshot, ServerMessage};

/// How often each connection checks its room's clocks.
const CLOCK_TICK: Duration = Duration::from_millis(500);

/// WebSocket handler for chess games
pub struct ChessWebSocket {
    pub id: String,
    pub app_state: web::Data<AppState>,
    pub game_id: String,
    pub color: Option<Color>,
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Register the actor with the application state
        let addr = ctx.address();
        self.app_state
            .sessions
            .lock()
            .unwrap()
            .insert(self.id.clone(), addr);

        let total_sessions = self.app_state.sessions.lock().unwrap().len();
        info!("WebSocket connection started: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        // Drive the room clocks. Ticks are based on elapsed wall-clock
        // time, so overlapping ticks from both connections are harmless.
        ctx.run_interval(CLOCK_TICK, |act, _ctx| {
            act.tick_clocks();
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        // Remove the actor from any game it was part of
        if !self.game_id.is_empty() {
            let mut connections = self.app_state.connections.lock().unwrap();
            if let Some(connection_ids) = connections.get_mut(&self.game_id) {
                connection_ids.retain(|id| id != &self.id);
                info!("Removed player {} from game {}'s connections", self.id, self.game_id);

                // Last one out tears the room down, timer included.
                if connection_ids.is_empty() {
                    info!("No more players in game {}. Cleaning up.", self.game_id);
                    connections.remove(&self.game_id);

                    let mut rooms = self.app_state.rooms.lock().unwrap();
                    rooms.remove(&self.game_id);
                    info!("Removed game state for {}", self.game_id);
                }
            }
            drop(connections);

            // A disconnect frees the seat but keeps the game running for
            // the remaining player.
            let mut rooms = self.app_state.rooms.lock().unwrap();
            if let Some(room) = rooms.get_mut(&self.game_id) {
                if let Some(color) = room.color_of(&self.id) {
                    info!("Freeing {} seat of player {} in game {}", color, self.id, self.game_id);
                }
                room.clear_seat(&self.id);
            }
        }

        self.app_state.sessions.lock().unwrap().remove(&self.id);
        let total_sessions = self.app_state.sessions.lock().unwrap().len();
        info!("WebSocket connection closed: {}", self.id);
        info!("Total active sessions: {}", total_sessions);

        Running::Stop
    }
}

impl Handler<ChessWebSocketMessage> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: ChessWebSocketMessage, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// WebSocket message handler
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                // Do nothing for pong messages
            }
            Ok(ws::Message::Text(text)) => {
                info!("Received text message: {}", text);
                match serde_json::from_str::<ClientMessage>(text.as_ref()) {
                    Ok(client_msg) => {
                        self.handle_message(client_msg, ctx);
                    }
                    Err(e) => {
                        warn!("Error parsing client message: {}", e);
                        self.send(ctx, &ServerMessage::error(format!("Invalid message format: {}", e)));
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send(ctx, &ServerMessage::error("Binary messages are not supported".to_string()));
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            _ => {
                ctx.stop();
            }
        }
    }
}

impl ChessWebSocket {
    pub fn handle_message(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match msg.message_type.as_str() {
            "create" => self.handle_create(msg, ctx),
            "join" => self.handle_join(msg, ctx),
            "move" => self.handle_move(msg, ctx),
            "promote" => self.handle_promote(msg, ctx),
            "get_moves" => self.handle_get_moves(msg, ctx),
            "set_time" => self.handle_set_time(msg, ctx),
            "time_sync" => self.handle_time_sync(msg, ctx),
            _ => {
                warn!("Unknown message type: {}", msg.message_type);
                self.send(
                    ctx,
                    &ServerMessage::error(format!("Unknown message type: {}", msg.message_type)),
                );
            }
        }
    }

    pub fn send(&self, ctx: &mut ws::WebsocketContext<Self>, message: &ServerMessage) {
        match serde_json::to_string(message) {
            Ok(text) => ctx.text(text),
            Err(e) => {
                warn!("Failed to serialize response: {}", e);
                ctx.text("{\"message_type\":\"error\",\"error\":\"Internal server error\"}");
            }
        }
    }

    pub fn broadcast_to_room(&self, game_id: &str, message: &ServerMessage) {
        info!("Broadcasting {} to game {}", message.message_type, game_id);

        // Scope the locks to minimize lock time
        let connection_ids;
        let sessions_copy;
        {
            let connections = self.app_state.connections.lock().unwrap();
            connection_ids = match connections.get(game_id) {
                Some(ids) => ids.clone(),
                None => {
                    warn!("No connections found for game {}", game_id);
                    return;
                }
            };

            let sessions = self.app_state.sessions.lock().unwrap();
            sessions_copy = sessions.clone();
        }

        // Serialize the message once
        let message_str = match serde_json::to_string(message) {
            Ok(s) => s,
            Err(e) => {
                warn!("Error serializing message: {}", e);
                return;
            }
        };

        for conn_id in connection_ids {
            if let Some(addr) = sessions_copy.get(&conn_id) {
                addr.do_send(ChessWebSocketMessage(message_str.clone()));
            } else {
                warn!("Session not found for connection ID: {}", conn_id);
            }
        }
    }

    /// Push the room's current snapshot to everyone in it.
    pub fn broadcast_update(&self, game_id: &str, snapshot: GameSnapshot) {
        let message = ServerMessage {
            game_id: Some(game_id.to_string()),
            game: Some(snapshot),
            ..ServerMessage::empty("game_update")
        };
        self.broadcast_to_room(game_id, &message);
    }

    /// Periodic clock check for this connection's room. A flag fall is a
    /// first-class terminal transition, pushed to the room like any other
    /// state change.
    fn tick_clocks(&self) {
        if self.game_id.is_empty() {
            return;
        }
        let ended;
        let snapshot;
        {
            let mut rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get_mut(&self.game_id) {
                Some(room) => room,
                None => return,
            };
            ended = room.game.tick(Instant::now());
            snapshot = ended.is_some().then(|| GameSnapshot::capture(&room.game));
        }
        if let Some(result) = ended {
            info!("Game {} ended on time: {:?}", self.game_id, result);
            if let Some(snapshot) = snapshot {
                self.broadcast_update(&self.game_id, snapshot);
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = Uuid::new_v4().to_string();
    info!("New WebSocket connection: {}", id);

    let ws = ChessWebSocket {
        id,
        app_state: app_state.clone(),
        game_id: String::new(),
        color: None,
    };

    ws::start(ws, &req, stream)
}
