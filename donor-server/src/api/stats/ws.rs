//! Live stats WebSocket
//!
//! GET /api/stats/ws
//!
//! Server → client only: `{"event":"statsUpdate","data":{...}}`. The current
//! figures are sent on connect, then again whenever they change.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use shared::error::{AppError, ErrorCode};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::core::ServerState;
use crate::stats::hub::STATS_EVENT;
use crate::stats::service::compute_live_stats;
use crate::stats::{StatsBroadcast, StatsSubscription};

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub async fn handle_stats_ws(
    State(state): State<ServerState>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let subscription = state.stats_hub.subscribe().ok_or_else(|| {
        AppError::with_message(ErrorCode::DependencyUnavailable, "Stats stream is shutting down")
    })?;
    Ok(ws.on_upgrade(move |socket| stats_ws_session(socket, state, subscription)))
}

async fn send_frame(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: &StatsBroadcast,
) -> Result<(), ()> {
    let text = serde_json::to_string(frame).map_err(|e| {
        tracing::warn!(error = %e, "Failed to serialize stats frame");
    })?;
    sink.send(Message::Text(text.into())).await.map_err(|_| ())
}

async fn send_current(sink: &mut SplitSink<WebSocket, Message>, state: &ServerState) -> Result<(), ()> {
    match compute_live_stats(&state.pool).await {
        Ok(data) => {
            let frame = StatsBroadcast {
                event: STATS_EVENT,
                data,
            };
            send_frame(sink, &frame).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to compute live stats for new subscriber");
            Ok(())
        }
    }
}

async fn stats_ws_session(socket: WebSocket, state: ServerState, subscription: StatsSubscription) {
    let (mut sink, mut stream) = socket.split();
    let StatsSubscription { mut rx, closed } = subscription;

    tracing::info!(subscribers = state.stats_hub.subscriber_count(), "Stats WS connected");

    if send_current(&mut sink, &state).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = closed.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            frame = rx.recv() => {
                match frame {
                    Ok(frame) => {
                        if send_frame(&mut sink, &frame).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "Stats subscriber lagged, resending current figures");
                        if send_current(&mut sink, &state).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Clients have nothing to say; ignore text and pongs
                    _ => {}
                }
            }
        }
    }

    tracing::info!("Stats WS disconnected");
}
