//! Device Push Channel
//!
//! One WebSocket per device page. Inbound frames are handled one at a time
//! and each reply goes out on the same connection before the next frame is
//! read. The write half is also registered in the session directory under
//! every id0 the connection names, so other operations can push to it.

use crate::application::{IntakeUseCase, Notifier};
use crate::domain::repository::DeviceRepository;
use crate::domain::value_objects::Id0;
use crate::infra::session::{ChannelError, Frame, SharedSink, shared_sink};
use crate::presentation::dto::InboundMessage;
use crate::presentation::handlers::CoordinatorAppState;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, Stream, StreamExt, future};
use reputation::MinerRepository;
use std::sync::Arc;

/// Inbound frame, reduced to what the protocol cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Text(String),
    Close,
    Other,
}

impl From<Result<Message, axum::Error>> for InboundFrame {
    fn from(message: Result<Message, axum::Error>) -> Self {
        match message {
            Ok(Message::Text(text)) => InboundFrame::Text(text.as_str().to_owned()),
            Ok(Message::Close(_)) | Err(_) => InboundFrame::Close,
            Ok(_) => InboundFrame::Other,
        }
    }
}

/// GET /socket
pub async fn socket<R, M>(
    State(state): State<CoordinatorAppState<R, M>>,
    ws: WebSocketUpgrade,
) -> Response
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket<R, M>(socket: WebSocket, state: CoordinatorAppState<R, M>)
where
    R: DeviceRepository + Clone + Send + Sync + 'static,
    M: MinerRepository + Clone + Send + Sync + 'static,
{
    let (writer, reader) = socket.split();

    let writer = writer
        .with(|frame: Frame| {
            future::ready(Ok::<_, axum::Error>(match frame {
                Frame::Text(text) => Message::Text(text.into()),
                Frame::Close => Message::Close(None),
            }))
        })
        .sink_map_err(|e| ChannelError(e.to_string()));

    run_connection(
        state.intake(),
        state.notifier.clone(),
        shared_sink(writer),
        reader.map(InboundFrame::from),
    )
    .await;
}

/// Drive one connection until it closes or sends malformed JSON
pub async fn run_connection<R, S>(
    intake: IntakeUseCase<R>,
    notifier: Arc<Notifier<R>>,
    sink: SharedSink,
    mut inbound: S,
) where
    R: DeviceRepository,
    S: Stream<Item = InboundFrame> + Unpin,
{
    let sessions = notifier.sessions().clone();
    let connection_id = sessions.next_connection_id();
    tracing::debug!(connection_id, "Push channel opened");

    while let Some(frame) = inbound.next().await {
        let text = match frame {
            InboundFrame::Text(text) => text,
            InboundFrame::Close => break,
            InboundFrame::Other => continue,
        };

        let message: InboundMessage = match serde_json::from_str(&text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(connection_id, error = %e, "Malformed push frame, closing");
                break;
            }
        };

        let Some((raw_id0, intent)) = message.into_intent() else {
            continue;
        };

        if let Ok(id0) = Id0::parse(&raw_id0) {
            sessions.register(&id0, connection_id, sink.clone()).await;
        }

        tracing::debug!(connection_id, id0 = %raw_id0, intent = intent.name(), "Device message");

        let reply = match intake.execute(&raw_id0, intent).await {
            Ok(reply) => reply,
            Err(e) => {
                e.log();
                None
            }
        };

        if let Some(status) = reply {
            let text = notifier.render(status).await;
            if let Err(e) = sink.lock().await.send(Frame::Text(text)).await {
                tracing::debug!(connection_id, error = %e, "Reply failed, closing");
                break;
            }
        }
    }

    sessions.remove_connection(connection_id);
    tracing::debug!(connection_id, "Push channel closed");
}
