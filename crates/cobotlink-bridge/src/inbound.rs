//! Inbound frame routing and the latest-value cells.
//!
//! [`Inbound`] is owned by the transport's reader task and is the only
//! writer of the two cells. Each cell is a [`watch`] channel holding an
//! immutable `Arc` snapshot, so readers either see the previous value or the
//! new one, never a half-written record.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use cobotlink_types::{BridgeError, Pose};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::protocol::{CompressedImageMsg, RosbridgeOp, StringMsg};
use crate::scene::{FrameClock, Scene, decode_frame};
use crate::topics::InboundTopic;

pub type SceneCell = watch::Receiver<Option<Arc<Scene>>>;
pub type PoseCell = watch::Receiver<Option<Arc<Pose>>>;

/// Writer half of the scene and pose cells.
pub struct Inbound {
    scene: watch::Sender<Option<Arc<Scene>>>,
    pose: watch::Sender<Option<Arc<Pose>>>,
    clock: FrameClock,
}

impl Inbound {
    /// Create the writer together with reader handles for both cells.
    pub fn channel() -> (Self, SceneCell, PoseCell) {
        let (scene, scene_rx) = watch::channel(None);
        let (pose, pose_rx) = watch::channel(None);
        let inbound = Self {
            scene,
            pose,
            clock: FrameClock::new(),
        };
        (inbound, scene_rx, pose_rx)
    }

    /// Handle one text frame from the bridge.
    ///
    /// Nothing here propagates: a frame that cannot be used is logged and
    /// dropped, leaving both cells untouched.
    pub fn dispatch(&mut self, text: &str) {
        let op = match RosbridgeOp::parse(text) {
            Ok(op) => op,
            Err(e) => {
                warn!(error = %e, "dropping unparseable bridge frame");
                return;
            }
        };

        match op {
            RosbridgeOp::Publish { topic, msg, .. } => match InboundTopic::from_name(&topic) {
                Some(InboundTopic::Scene) => {
                    if let Err(e) = self.on_scene(msg) {
                        warn!(topic = %topic, error = %e, "scene frame dropped");
                    }
                }
                Some(InboundTopic::Pose) => {
                    if let Err(e) = self.on_pose(msg) {
                        warn!(topic = %topic, error = %e, "pose message dropped");
                    }
                }
                None => debug!(topic = %topic, "ignoring publish on unrouted topic"),
            },
            RosbridgeOp::Status { level, msg, id } => match level.as_str() {
                "error" | "warning" => warn!(level = %level, id = ?id, "rosbridge: {msg}"),
                _ => info!(level = %level, id = ?id, "rosbridge: {msg}"),
            },
            other => debug!(op = ?other, "ignoring bridge op"),
        }
    }

    /// Decode a camera frame and publish it as the latest scene.
    pub fn on_scene(&mut self, msg: Value) -> Result<(), BridgeError> {
        self.on_scene_at(msg, Instant::now())
    }

    pub(crate) fn on_scene_at(&mut self, msg: Value, now: Instant) -> Result<(), BridgeError> {
        let body: CompressedImageMsg = serde_json::from_value(msg)
            .map_err(|e| BridgeError::Decode(format!("message body: {e}")))?;
        let image = decode_frame(&body)?;
        let fps = self.clock.tick(now);
        let scene = Scene {
            image,
            format: body.format,
            received_at: Utc::now(),
            fps,
        };
        debug!(width = scene.width(), height = scene.height(), fps, "scene updated");
        self.scene.send_replace(Some(Arc::new(scene)));
        Ok(())
    }

    /// Parse the pose JSON and publish it as the latest pose.
    pub fn on_pose(&mut self, msg: Value) -> Result<(), BridgeError> {
        let body: StringMsg = serde_json::from_value(msg)
            .map_err(|e| BridgeError::Parse(format!("message body: {e}")))?;
        let pose = Pose::from_json(&body.data)?;
        self.pose.send_replace(Some(Arc::new(pose)));
        Ok(())
    }
}
