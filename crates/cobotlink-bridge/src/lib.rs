//! `cobotlink-bridge` – rosbridge client for the JetCobot arm
//!
//! Connects to the arm's `rosbridge_server` over WebSocket, keeps the latest
//! camera frame and pose in memory, and publishes typed control commands.
//!
//! # Modules
//!
//! - [`client`] – [`BridgeClient`], the blocking facade applications use.
//! - [`config`] – [`ClientConfig`] connection and readiness settings.
//! - [`inbound`] – routes inbound frames into the latest-value cells.
//! - [`protocol`] – rosbridge v2 operation frames and message bodies.
//! - [`scene`] – compressed-image decoding and the frame-rate estimate.
//! - [`topics`] – the fixed `SceneNode` / `PoseNode` / `ControlNode` table.
//! - [`transport`] – WebSocket reader/writer tasks.

pub mod client;
pub mod config;
pub mod inbound;
pub mod protocol;
pub mod scene;
pub mod topics;
pub mod transport;

pub use client::BridgeClient;
pub use config::{ClientConfig, DEFAULT_PORT};
pub use scene::Scene;
