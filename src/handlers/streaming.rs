//! `GET /ws` and `GET /sse` (spec §6): a WebSocket echo and a 2-second
//! Server-Sent-Events clock tick. The SSE stream observes the server's
//! shutdown cancellation token so it stops promptly on graceful shutdown
//! (spec §5: "SSE streaming must observe the request's cancellation
//! channel and exit").

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures_util::stream::{Stream, StreamExt};
use tokio_stream::wrappers::IntervalStream;

use crate::handlers::AppState;

pub async fn ws(upgrade: WebSocketUpgrade) -> Response {
    upgrade.on_upgrade(handle_socket).into_response()
}

async fn handle_socket(mut socket: WebSocket) {
    while let Some(Ok(msg)) = socket.recv().await {
        let echoed = match msg {
            Message::Text(text) => Some(Message::Text(text)),
            Message::Binary(data) => Some(Message::Binary(data)),
            Message::Close(_) => break,
            _ => None,
        };
        if let Some(reply) = echoed {
            if socket.send(reply).await.is_err() {
                break;
            }
        }
    }
}

pub async fn sse(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let ticks = IntervalStream::new(tokio::time::interval(Duration::from_secs(2)))
        .map(|_| Ok(Event::default().data(format!("The time is {}", chrono::Utc::now().to_rfc3339()))));

    let stream = ticks.take_until(state.shutdown.clone().cancelled_owned());
    Sse::new(stream)
}
