//! In-process stand-in for `rosbridge_server`.
//!
//! Runs on its own thread and runtime so tests can drive the blocking
//! [`BridgeClient`][cobotlink_bridge::BridgeClient] from the test thread.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use futures_util::{SinkExt, StreamExt};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};

pub struct FakeRosbridge {
    pub port: u16,
    to_client: mpsc::UnboundedSender<String>,
    from_client: std_mpsc::Receiver<Value>,
}

impl FakeRosbridge {
    /// Bind an ephemeral port and serve exactly one client.
    pub fn start() -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.set_nonblocking(true).expect("nonblocking");
        let port = listener.local_addr().expect("local addr").port();

        let (to_client, mut outbound) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, from_client) = std_mpsc::channel::<Value>();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            rt.block_on(async move {
                let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
                let (stream, _) = listener.accept().await.expect("accept");
                let ws = accept_async(stream).await.expect("handshake");
                let (mut tx, mut rx) = ws.split();

                loop {
                    tokio::select! {
                        out = outbound.recv() => match out {
                            Some(text) => {
                                if tx.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                        msg = rx.next() => match msg {
                            Some(Ok(Message::Text(text))) => {
                                let value: Value = serde_json::from_str(text.as_str())
                                    .expect("client sent invalid JSON");
                                if inbound_tx.send(value).is_err() {
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                            Some(Ok(_)) => {}
                        },
                    }
                }
            });
        });

        Self {
            port,
            to_client,
            from_client,
        }
    }

    pub fn send_raw(&self, text: impl Into<String>) {
        self.to_client.send(text.into()).expect("fake server stopped");
    }

    pub fn publish_scene(&self, data: &str) {
        self.send_raw(
            json!({"op": "publish", "topic": "SceneNode", "msg": {"format": "png", "data": data}})
                .to_string(),
        );
    }

    pub fn publish_pose(&self, pose: &str) {
        self.send_raw(
            json!({"op": "publish", "topic": "PoseNode", "msg": {"data": pose}}).to_string(),
        );
    }

    /// Next frame the client sent, waiting up to two seconds.
    pub fn next_frame(&self) -> Value {
        self.from_client
            .recv_timeout(Duration::from_secs(2))
            .expect("no frame from client")
    }

    /// Skip frames until a `publish` on `ControlNode` arrives and return the
    /// decoded command JSON from its `data` field.
    pub fn next_command(&self) -> Value {
        loop {
            let frame = self.next_frame();
            if frame["op"] == "publish" && frame["topic"] == "ControlNode" {
                let data = frame["msg"]["data"].as_str().expect("data must be a string");
                return serde_json::from_str(data).expect("command data must be JSON");
            }
        }
    }
}

/// base64 PNG of a solid frame.
pub fn frame(width: u32, height: u32, rgb: [u8; 3]) -> String {
    let img = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .expect("encode png");
    STANDARD.encode(buf)
}
