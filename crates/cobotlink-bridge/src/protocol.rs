//! rosbridge v2 wire frames.
//!
//! Every WebSocket text frame is a JSON object with an `"op"` field. This
//! client only speaks the handful of operations it needs:
//!
//! * `advertise` / `subscribe` – sent once, right after the handshake.
//! * `publish` – sent for every control command and received for every
//!   image / pose sample.
//! * `status` – received when the server rejects a request.
//!
//! Any other op deserialises to [`RosbridgeOp::Other`] and is ignored.

use cobotlink_types::{BridgeError, ControlCommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::topics::{CONTROL, TopicSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RosbridgeOp {
    Advertise {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
    },
    Subscribe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        #[serde(rename = "type")]
        msg_type: String,
        /// Keep only the newest sample server-side; the client overwrites
        /// anyway.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        queue_length: Option<u32>,
    },
    Publish {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        topic: String,
        msg: Value,
    },
    Status {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        level: String,
        #[serde(default)]
        msg: String,
    },
    #[serde(other)]
    Other,
}

impl RosbridgeOp {
    pub fn advertise(topic: TopicSpec) -> Self {
        RosbridgeOp::Advertise {
            id: Some(op_id("advertise", topic.name)),
            topic: topic.name.to_string(),
            msg_type: topic.msg_type.to_string(),
        }
    }

    pub fn subscribe(topic: TopicSpec) -> Self {
        RosbridgeOp::Subscribe {
            id: Some(op_id("subscribe", topic.name)),
            topic: topic.name.to_string(),
            msg_type: topic.msg_type.to_string(),
            queue_length: Some(1),
        }
    }

    /// Wrap a control command in a `std_msgs/String` publish on
    /// `ControlNode`: `{"data": "<command json>"}`.
    pub fn control(command: &ControlCommand) -> Result<Self, BridgeError> {
        let data = command.to_json()?;
        Ok(RosbridgeOp::Publish {
            id: None,
            topic: CONTROL.name.to_string(),
            msg: serde_json::to_value(StringMsg { data })
                .map_err(|e| BridgeError::Serialization(e.to_string()))?,
        })
    }

    /// Parse one inbound text frame.
    pub fn parse(text: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(text).map_err(|e| BridgeError::Parse(format!("frame: {e}")))
    }

    pub fn to_text(&self) -> Result<String, BridgeError> {
        serde_json::to_string(self).map_err(|e| BridgeError::Serialization(e.to_string()))
    }
}

fn op_id(op: &str, topic: &str) -> String {
    format!("{op}:{topic}:{}", Uuid::new_v4())
}

/// `std_msgs/String` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringMsg {
    pub data: String,
}

/// `sensor_msgs/CompressedImage` body as rosbridge encodes it: the
/// `uint8[]` payload arrives as a base64 string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressedImageMsg {
    /// Encoding hint such as `"jpeg"` or `"png"`. Optional on the wire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub data: String,
}
