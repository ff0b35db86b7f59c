//! Ping round-trip echo.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::clock::ServerClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingRequest {
    pub client_time: i64,
    pub seq: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingExchange {
    pub seq: i64,
    pub client_time: i64,
    pub server_time: i64,
    pub server_process_time: i64,
}

impl PingExchange {
    /// Build the reply. `received` is captured when the request reached the
    /// handler; nothing but timestamp arithmetic happens here.
    pub fn respond(request: PingRequest, clock: &ServerClock, received: Instant) -> Self {
        let server_time = clock.now_ms();
        Self {
            seq: request.seq,
            client_time: request.client_time,
            server_time,
            server_process_time: server_time - clock.at_ms(received),
        }
    }
}
