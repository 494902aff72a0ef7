use crate::message::{ClientRequest, Payload, ServerMessage, SnapshotCache};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use std::{net::SocketAddr, sync::Arc};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{broadcast, mpsc},
};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// Shared state handed to every client task
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub tx: Arc<broadcast::Sender<Payload>>,
    pub cache: SnapshotCache,
    pub symbols: Arc<[String]>,
}

/// Accept connections forever, spawning a task per client.
pub async fn serve(listener: TcpListener, context: ClientContext) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                info!(%peer_addr, "new WebSocket connection");
                tokio::spawn(handle_client(stream, peer_addr, context.clone()));
            }
            Err(error) => {
                warn!(%error, "failed to accept connection");
            }
        }
    }
}

/// Handle individual WebSocket client connection
async fn handle_client(stream: TcpStream, peer_addr: SocketAddr, context: ClientContext) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(error) => {
            error!(%peer_addr, %error, "WebSocket handshake failed");
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Subscribe before replaying the cache so no snapshot published in between is missed
    let mut rx = context.tx.subscribe();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Payload>();

    let welcome = ServerMessage::Welcome {
        message: "Connected to liqmap heatmap feed".to_string(),
        symbols: context.symbols.to_vec(),
        timestamp: Utc::now(),
    };
    let mut initial = Vec::new();
    match welcome.to_payload() {
        Ok(payload) => initial.push(payload),
        Err(error) => error!(%peer_addr, %error, "failed to serialise welcome"),
    }
    initial.extend(context.cache.all());

    let mut send_task = tokio::spawn(async move {
        for payload in initial {
            if ws_sender.send(frame(&payload)).await.is_err() {
                return;
            }
        }

        loop {
            let payload = tokio::select! {
                broadcast = rx.recv() => match broadcast {
                    Ok(payload) => payload,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(%peer_addr, skipped, "client lagged, skipped snapshots");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!(%peer_addr, "broadcast channel closed");
                        break;
                    }
                },
                reply = reply_rx.recv() => match reply {
                    Some(payload) => payload,
                    None => break,
                },
            };

            if ws_sender.send(frame(&payload)).await.is_err() {
                break;
            }
        }
    });

    let cache = context.cache.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(message) = ws_receiver.next().await {
            match message {
                Ok(Message::Close(_)) => break,
                Ok(Message::Text(text)) => {
                    let Some(reply) = respond(&cache, text.as_str()) else {
                        debug!(%peer_addr, text = text.as_str(), "ignoring client message");
                        continue;
                    };
                    if reply_tx.send(reply).is_err() {
                        break;
                    }
                }
                Ok(Message::Ping(_)) => {
                    debug!(%peer_addr, "received ping");
                }
                Err(error) => {
                    error!(%peer_addr, %error, "WebSocket error");
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            debug!(%peer_addr, "send task completed");
            recv_task.abort();
        }
        _ = &mut recv_task => {
            debug!(%peer_addr, "receive task completed");
            send_task.abort();
        }
    }

    info!(%peer_addr, "WebSocket connection closed");
}

/// Build the reply to a raw client text frame, if it is a recognised request.
pub fn respond(cache: &SnapshotCache, text: &str) -> Option<Payload> {
    let ClientRequest::Request { symbol } = serde_json::from_str(text).ok()?;

    match cache.get(&symbol) {
        Some(payload) => Some(payload),
        None => ServerMessage::Error {
            message: format!("no snapshot available for {}", symbol.trim().to_uppercase()),
        }
        .to_payload()
        .ok(),
    }
}

fn frame(payload: &Payload) -> Message {
    Message::Text(payload.to_string().into())
}
