//! [`BridgeClient`] – blocking facade over the rosbridge connection.
//!
//! The client owns a small multi-threaded Tokio runtime. Construction blocks
//! the calling thread until the first camera frame and the first pose have
//! both arrived; afterwards every accessor is a non-blocking snapshot read and
//! every command is a non-blocking enqueue.
//!
//! # Example
//!
//! ```rust,no_run
//! use cobotlink_bridge::BridgeClient;
//!
//! let client = BridgeClient::connect("192.168.1.42", 9090)?;
//! println!("joints: {:?}", client.get_angles()?);
//! client.control_gripper(20.0)?;
//! # Ok::<(), cobotlink_types::BridgeError>(())
//! ```

use std::sync::Arc;
use std::time::Duration;

use cobotlink_types::{BridgeError, ControlCommand, CoordTarget, Pose};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::inbound::{Inbound, PoseCell, SceneCell};
use crate::protocol::RosbridgeOp;
use crate::scene::Scene;
use crate::topics::{POSE, SCENE};
use crate::transport::{self, Connection};

/// Connection to a JetCobot `rosbridge_server` holding the latest camera frame
/// and pose.
///
/// The client is `Send + Sync`; share it behind an `Arc` to read state or
/// publish commands from several threads.
pub struct BridgeClient {
    config: ClientConfig,
    scene: SceneCell,
    pose: PoseCell,
    connection: Connection,
    runtime: Option<Runtime>,
}

impl BridgeClient {
    /// Connect to `ws://host:port` and block until both inbound channels have
    /// delivered a first message.
    ///
    /// With the default configuration this waits forever if the arm never
    /// publishes; use [`with_config`][Self::with_config] and
    /// [`ClientConfig::with_ready_timeout`] to bound the wait.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Connection`] if the handshake fails.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime, because the readiness
    /// wait blocks the current thread.
    pub fn connect(host: impl Into<String>, port: u16) -> Result<Self, BridgeError> {
        Self::with_config(ClientConfig::new(host, port))
    }

    /// Connect using a full [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// * [`BridgeError::Connection`] – TCP connect or WebSocket handshake
    ///   failed or exceeded `connect_timeout_ms`.
    /// * [`BridgeError::ReadyTimeout`] – `ready_timeout_ms` elapsed before
    ///   both channels delivered.
    /// * [`BridgeError::Disconnected`] – the bridge hung up during the wait.
    /// * [`BridgeError::Runtime`] – the internal runtime could not start.
    pub fn with_config(config: ClientConfig) -> Result<Self, BridgeError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("cobotlink-bridge")
            .enable_all()
            .build()
            .map_err(|e| BridgeError::Runtime(e.to_string()))?;

        let (inbound, scene, pose) = Inbound::channel();
        let url = config.url();

        let started = runtime.block_on(async {
            let connection = transport::open(&url, config.connect_timeout(), inbound).await?;
            wait_ready(
                &scene,
                &pose,
                config.ready_log_interval(),
                config.ready_timeout(),
            )
            .await?;
            Ok::<_, BridgeError>(connection)
        });

        let connection = match started {
            Ok(connection) => connection,
            Err(e) => {
                runtime.shutdown_background();
                return Err(e);
            }
        };
        info!(url = %url, "all bridge channels ready");

        Ok(Self {
            config,
            scene,
            pose,
            connection,
            runtime: Some(runtime),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// `true` while the socket is still being read and written.
    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// Most recently decoded camera frame.
    ///
    /// Always `Some` once construction has returned.
    pub fn get_scene(&self) -> Option<Arc<Scene>> {
        self.scene.borrow().clone()
    }

    /// Most recently received pose record.
    pub fn get_pose(&self) -> Option<Arc<Pose>> {
        self.pose.borrow().clone()
    }

    /// Joint angles from the latest pose.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MissingField`] if the pose lacks `angle`.
    pub fn get_angles(&self) -> Result<Vec<f64>, BridgeError> {
        match self.pose.borrow().as_deref() {
            Some(pose) => pose.angles().map(<[f64]>::to_vec),
            None => Err(BridgeError::MissingField("angle")),
        }
    }

    /// Cartesian coordinates from the latest pose.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::MissingField`] if the pose lacks `coord`.
    pub fn get_coords(&self) -> Result<Vec<f64>, BridgeError> {
        match self.pose.borrow().as_deref() {
            Some(pose) => pose.coords().map(<[f64]>::to_vec),
            None => Err(BridgeError::MissingField("coord")),
        }
    }

    /// Frame rate derived from the two most recent frames.
    pub fn fps(&self) -> f64 {
        self.scene.borrow().as_ref().map_or(0.0, |scene| scene.fps)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Commands
    // ─────────────────────────────────────────────────────────────────────────

    /// Publish `command` on `ControlNode`. Fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Disconnected`] once the writer has stopped.
    pub fn publish(&self, command: &ControlCommand) -> Result<(), BridgeError> {
        debug!(tag = command.tag(), "publishing control command");
        self.connection.send(&RosbridgeOp::control(command)?)
    }

    pub fn control_angle(&self, id: i64, angle: f64) -> Result<(), BridgeError> {
        self.publish(&ControlCommand::Angle { id, angle })
    }

    pub fn control_coord(&self, id: i64, coord: impl Into<CoordTarget>) -> Result<(), BridgeError> {
        self.publish(&ControlCommand::Coord {
            id,
            coord: coord.into(),
        })
    }

    pub fn control_angles(&self, angles: &[f64]) -> Result<(), BridgeError> {
        self.publish(&ControlCommand::Angles {
            angle: angles.to_vec(),
        })
    }

    pub fn control_coords(&self, coords: &[f64]) -> Result<(), BridgeError> {
        self.publish(&ControlCommand::Coords {
            coord: coords.to_vec(),
        })
    }

    pub fn control_gripper(&self, value: f64) -> Result<(), BridgeError> {
        self.publish(&ControlCommand::Gripper { gripper: value })
    }
}

impl Drop for BridgeClient {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

/// Resolve once both cells hold a value.
///
/// Waiting is driven by the cells' change notifications; `log_every` only
/// paces the diagnostic naming the channel(s) still silent.
pub(crate) async fn wait_ready(
    scene: &SceneCell,
    pose: &PoseCell,
    log_every: Duration,
    timeout: Option<Duration>,
) -> Result<(), BridgeError> {
    let mut scene_rx = scene.clone();
    let mut pose_rx = pose.clone();

    let ready = async move {
        pose_rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| BridgeError::Disconnected)?;
        scene_rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| BridgeError::Disconnected)?;
        Ok::<(), BridgeError>(())
    };
    let deadline = async move {
        match timeout {
            Some(t) => tokio::time::sleep(t).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(ready, deadline);

    let mut ticker = tokio::time::interval(log_every);
    loop {
        tokio::select! {
            biased;
            result = &mut ready => return result,
            () = &mut deadline => {
                return Err(BridgeError::ReadyTimeout(timeout.unwrap_or_default()));
            }
            _ = ticker.tick() => log_pending(scene, pose),
        }
    }
}

fn log_pending(scene: &SceneCell, pose: &PoseCell) {
    if pose.borrow().is_none() {
        info!(topic = POSE.name, "still waiting for the robot pose");
    }
    if scene.borrow().is_none() {
        info!(topic = SCENE.name, "still waiting for the first camera frame");
    }
}
