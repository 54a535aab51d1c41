use std::time::Instant;

use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::engine::{Color, Move, PieceKind, Square, SubmitOutcome};
use crate::models::utils::{color_to_string, parse_color};
use crate::models::{ClientMessage, GameSnapshot, Room, ServerMessage};
use crate::websocket::handler::ChessWebSocket;

impl ChessWebSocket {
    pub fn handle_create(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        info!("Creating new game");

        let time_control_secs = msg.time_control_secs.unwrap_or(600);
        let color = msg
            .color_preference
            .as_deref()
            .and_then(parse_color)
            .unwrap_or(Color::White);

        let game_id = Uuid::new_v4().to_string();
        info!("Generated game ID: {}", game_id);

        self.game_id = game_id.clone();
        self.color = Some(color);

        let snapshot;
        {
            let mut room = Room::new(time_control_secs);
            room.seat(color, self.id.clone(), Instant::now());
            snapshot = GameSnapshot::capture(&room.game);

            let mut rooms = self.app_state.rooms.lock().unwrap();
            rooms.insert(game_id.clone(), room);
        }
        {
            let mut connections = self.app_state.connections.lock().unwrap();
            connections.insert(game_id.clone(), vec![self.id.clone()]);
        }

        let response = ServerMessage {
            game_id: Some(game_id),
            color: Some(color_to_string(color)),
            game: Some(snapshot),
            ..ServerMessage::empty("game_created")
        };
        self.send(ctx, &response);
    }

    pub fn handle_join(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let game_id = match msg.game_id {
            Some(id) => id,
            None => {
                warn!("No game ID provided");
                self.send(ctx, &ServerMessage::error("No game ID provided".to_string()));
                return;
            }
        };
        info!("Player {} joining game {}", self.id, game_id);

        let preference = msg.color_preference.as_deref().and_then(parse_color);
        let color;
        let snapshot;
        {
            let mut rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get_mut(&game_id) {
                Some(room) => room,
                None => {
                    warn!("Game not found: {}", game_id);
                    self.send(ctx, &ServerMessage::error("Game not found".to_string()));
                    return;
                }
            };
            color = match room.free_seat(preference) {
                Some(color) => color,
                None => {
                    info!("Cannot join game {}: room is full", game_id);
                    self.send(ctx, &ServerMessage::error("Room is full".to_string()));
                    return;
                }
            };
            room.seat(color, self.id.clone(), Instant::now());
            snapshot = GameSnapshot::capture(&room.game);
        }
        {
            let mut connections = self.app_state.connections.lock().unwrap();
            if let Some(connection_ids) = connections.get_mut(&game_id) {
                if !connection_ids.contains(&self.id) {
                    connection_ids.push(self.id.clone());
                }
            } else {
                connections.insert(game_id.clone(), vec![self.id.clone()]);
            }
        }

        self.game_id = game_id.clone();
        self.color = Some(color);

        let response = ServerMessage {
            game_id: Some(game_id.clone()),
            color: Some(color_to_string(color)),
            game: Some(snapshot.clone()),
            ..ServerMessage::empty("game_joined")
        };
        self.send(ctx, &response);

        // Notify the other seat (and refresh its clock display).
        let notification = ServerMessage {
            game_id: Some(game_id.clone()),
            color: Some(color_to_string(color)),
            game: Some(snapshot),
            ..ServerMessage::empty("player_joined")
        };
        self.broadcast_to_room(&game_id, &notification);
    }

    pub fn handle_move(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        info!("Processing move: {:?}", msg);

        let color = match self.seat(ctx) {
            Some(color) => color,
            None => return,
        };
        let from = match self.parse_square(msg.move_from.as_deref(), ctx) {
            Some(sq) => sq,
            None => return,
        };
        let to = match self.parse_square(msg.move_to.as_deref(), ctx) {
            Some(sq) => sq,
            None => return,
        };
        let promotion = match msg.promote_to.as_deref() {
            Some(name) => match name.parse::<PieceKind>() {
                Ok(kind) => Some(kind),
                Err(()) => {
                    self.send(ctx, &ServerMessage::error("Invalid promotion piece".to_string()));
                    return;
                }
            },
            None => None,
        };
        let mv = Move { from, to, promotion };

        let outcome;
        let snapshot;
        {
            let mut rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get_mut(&self.game_id) {
                Some(room) => room,
                None => {
                    warn!("Game not found: {}", self.game_id);
                    self.send(ctx, &ServerMessage::error("Game not found".to_string()));
                    return;
                }
            };
            outcome = match room.game.submit_move(color, mv, Instant::now()) {
                Ok(outcome) => outcome,
                Err(reject) => {
                    info!("Move by {} rejected: {}", self.id, reject);
                    self.send(ctx, &ServerMessage::error(reject.to_string()));
                    return;
                }
            };
            snapshot = GameSnapshot::capture(&room.game);
        }

        if let SubmitOutcome::PromotionNeeded = outcome {
            let response = ServerMessage {
                game_id: Some(self.game_id.clone()),
                color: Some(color_to_string(color)),
                ..ServerMessage::empty("promotion_needed")
            };
            self.send(ctx, &response);
        }
        self.broadcast_update(&self.game_id, snapshot);
    }

    pub fn handle_promote(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        info!("Processing promotion choice: {:?}", msg);

        let color = match self.seat(ctx) {
            Some(color) => color,
            None => return,
        };
        let square = match self.parse_square(msg.square.as_deref(), ctx) {
            Some(sq) => sq,
            None => return,
        };
        let kind = match msg.promote_to.as_deref().map(str::parse::<PieceKind>) {
            Some(Ok(kind)) => kind,
            _ => {
                self.send(ctx, &ServerMessage::error("Invalid promotion piece".to_string()));
                return;
            }
        };

        let snapshot;
        {
            let mut rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get_mut(&self.game_id) {
                Some(room) => room,
                None => {
                    warn!("Game not found: {}", self.game_id);
                    self.send(ctx, &ServerMessage::error("Game not found".to_string()));
                    return;
                }
            };
            if let Err(reject) = room.game.choose_promotion(color, square, kind, Instant::now()) {
                info!("Promotion by {} rejected: {}", self.id, reject);
                self.send(ctx, &ServerMessage::error(reject.to_string()));
                return;
            }
            snapshot = GameSnapshot::capture(&room.game);
        }
        self.broadcast_update(&self.game_id, snapshot);
    }

    pub fn handle_get_moves(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let color = match self.seat(ctx) {
            Some(color) => color,
            None => return,
        };
        let from = match self.parse_square(msg.square.as_deref().or(msg.move_from.as_deref()), ctx)
        {
            Some(sq) => sq,
            None => return,
        };

        let moves: Vec<String>;
        {
            let rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get(&self.game_id) {
                Some(room) => room,
                None => {
                    warn!("Game not found: {}", self.game_id);
                    self.send(ctx, &ServerMessage::error("Game not found".to_string()));
                    return;
                }
            };
            moves = room
                .game
                .moves_from(color, from)
                .into_iter()
                .map(|sq| sq.to_string())
                .collect();
        }

        let response = ServerMessage {
            game_id: Some(self.game_id.clone()),
            color: Some(color_to_string(color)),
            available_moves: Some(moves),
            ..ServerMessage::empty("available_moves")
        };
        self.send(ctx, &response);
    }

    pub fn handle_set_time(&mut self, msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        if self.seat(ctx).is_none() {
            return;
        }
        let secs = match msg.time_control_secs {
            Some(secs) => secs,
            None => {
                self.send(ctx, &ServerMessage::error("No time control provided".to_string()));
                return;
            }
        };

        let snapshot;
        {
            let mut rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get_mut(&self.game_id) {
                Some(room) => room,
                None => {
                    warn!("Game not found: {}", self.game_id);
                    self.send(ctx, &ServerMessage::error("Game not found".to_string()));
                    return;
                }
            };
            if let Err(reject) = room.game.set_time_control(secs, Instant::now()) {
                self.send(ctx, &ServerMessage::error(reject.to_string()));
                return;
            }
            snapshot = GameSnapshot::capture(&room.game);
        }
        self.broadcast_update(&self.game_id, snapshot);
    }

    pub fn handle_time_sync(&mut self, _msg: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        if self.game_id.is_empty() {
            self.send(ctx, &ServerMessage::error("Not in a game".to_string()));
            return;
        }

        let snapshot;
        {
            let mut rooms = self.app_state.rooms.lock().unwrap();
            let room = match rooms.get_mut(&self.game_id) {
                Some(room) => room,
                None => {
                    warn!("Game not found: {}", self.game_id);
                    self.send(ctx, &ServerMessage::error("Game not found".to_string()));
                    return;
                }
            };
            // Settle the clocks before reporting them.
            room.game.tick(Instant::now());
            snapshot = GameSnapshot::capture(&room.game);
        }

        let response = ServerMessage {
            game_id: Some(self.game_id.clone()),
            color: self.color.map(color_to_string),
            game: Some(snapshot),
            ..ServerMessage::empty("time_sync")
        };
        self.send(ctx, &response);
    }

    /// The player's seat, or an error to the client when they are not in a
    /// game or only watching.
    fn seat(&self, ctx: &mut ws::WebsocketContext<Self>) -> Option<Color> {
        if self.game_id.is_empty() {
            warn!("Player {} is not in a game", self.id);
            self.send(ctx, &ServerMessage::error("Not in a game".to_string()));
            return None;
        }
        match self.color {
            Some(color) => Some(color),
            None => {
                warn!("Player {} has no seat in game {}", self.id, self.game_id);
                self.send(ctx, &ServerMessage::error("You are not seated".to_string()));
                None
            }
        }
    }

    fn parse_square(
        &self,
        value: Option<&str>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) -> Option<Square> {
        let text = match value {
            Some(text) => text,
            None => {
                self.send(ctx, &ServerMessage::error("No square provided".to_string()));
                return None;
            }
        };
        match text.parse::<Square>() {
            Ok(square) => Some(square),
            Err(()) => {
                warn!("Invalid square format: {}", text);
                self.send(
                    ctx,
                    &ServerMessage::error(format!("Invalid square format: {}", text)),
                );
                None
            }
        }
    }
}
