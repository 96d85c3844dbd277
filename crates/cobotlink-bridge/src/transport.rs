//! WebSocket transport to `rosbridge_server`.
//!
//! [`open`] performs the handshake, announces the client's topics, and
//! splits the socket into two tasks:
//!
//! * a **reader** that feeds every text frame to [`Inbound::dispatch`];
//! * a **writer** that drains an unbounded queue of outbound frames.
//!
//! Publishing therefore never waits on the socket; it only enqueues.

use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use cobotlink_types::BridgeError;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::inbound::Inbound;
use crate::protocol::RosbridgeOp;
use crate::topics::{CONTROL, POSE, SCENE};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Live bridge connection.
pub struct Connection {
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    /// Queue an operation for the writer task.
    pub fn send(&self, op: &RosbridgeOp) -> Result<(), BridgeError> {
        let text = op.to_text()?;
        self.outbound
            .send(Message::Text(text.into()))
            .map_err(|_| BridgeError::Disconnected)
    }

    /// `true` while both socket halves are still being serviced.
    pub fn is_open(&self) -> bool {
        !self.reader.is_finished() && !self.writer.is_finished()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader.abort();
        self.writer.abort();
    }
}

/// Connect to `url`, advertise `ControlNode`, and subscribe to `SceneNode`
/// and `PoseNode`.
///
/// Must be called from within a Tokio runtime; the reader and writer tasks
/// are spawned onto it.
///
/// # Errors
///
/// Returns [`BridgeError::Connection`] when the TCP connect or WebSocket
/// handshake fails or does not finish within `connect_timeout`.
pub async fn open(
    url: &str,
    connect_timeout: Duration,
    inbound: Inbound,
) -> Result<Connection, BridgeError> {
    let (ws, _response) = tokio::time::timeout(connect_timeout, connect_async(url))
        .await
        .map_err(|_| {
            BridgeError::Connection(format!("{url}: no handshake within {connect_timeout:?}"))
        })?
        .map_err(|e| BridgeError::Connection(format!("{url}: {e}")))?;
    info!(url = %url, "connected to rosbridge");

    let (sink, stream) = ws.split();
    let (outbound, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_loop(sink, rx));

    let connection = Connection {
        outbound,
        reader: tokio::spawn(read_loop(stream, inbound)),
        writer,
    };

    connection.send(&RosbridgeOp::advertise(CONTROL))?;
    for topic in [SCENE, POSE] {
        connection.send(&RosbridgeOp::subscribe(topic))?;
        debug!(topic = topic.name, msg_type = topic.msg_type, "subscribed");
    }

    Ok(connection)
}

async fn read_loop(mut stream: SplitStream<WsStream>, mut inbound: Inbound) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => inbound.dispatch(text.as_str()),
            Ok(Message::Close(reason)) => {
                info!(reason = ?reason, "rosbridge closed the connection");
                break;
            }
            Ok(Message::Binary(bytes)) => {
                debug!(len = bytes.len(), "ignoring binary frame");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "rosbridge read error");
                break;
            }
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(msg) = rx.recv().await {
        if let Err(e) = sink.send(msg).await {
            warn!(error = %e, "rosbridge write error");
            break;
        }
    }
    let _ = sink.close().await;
}
