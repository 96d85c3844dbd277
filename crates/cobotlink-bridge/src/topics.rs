//! Fixed topic table shared with the JetCobot controller.
//!
//! | Topic | Direction | ROS type |
//! |---|---|---|
//! | [`SCENE`] | inbound | `sensor_msgs/CompressedImage` |
//! | [`POSE`] | inbound | `std_msgs/String` (JSON text) |
//! | [`CONTROL`] | outbound, advertised | `std_msgs/String` (JSON text) |

/// Compressed camera frames published by the arm.
pub const SCENE: TopicSpec = TopicSpec {
    name: "SceneNode",
    msg_type: "sensor_msgs/CompressedImage",
};

/// Joint angles and Cartesian coordinates as JSON text.
pub const POSE: TopicSpec = TopicSpec {
    name: "PoseNode",
    msg_type: "std_msgs/String",
};

/// Control commands as JSON text.
pub const CONTROL: TopicSpec = TopicSpec {
    name: "ControlNode",
    msg_type: "std_msgs/String",
};

/// A topic name paired with its ROS message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicSpec {
    pub name: &'static str,
    pub msg_type: &'static str,
}

/// Inbound topics this client routes, resolved from a topic name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundTopic {
    Scene,
    Pose,
}

impl InboundTopic {
    /// Resolve a rosbridge topic name. Leading slashes are ignored since
    /// some rosbridge versions echo fully-qualified names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim_start_matches('/') {
            n if n == SCENE.name => Some(InboundTopic::Scene),
            n if n == POSE.name => Some(InboundTopic::Pose),
            _ => None,
        }
    }

    pub fn spec(self) -> TopicSpec {
        match self {
            InboundTopic::Scene => SCENE,
            InboundTopic::Pose => POSE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_inbound_topics() {
        assert_eq!(InboundTopic::from_name("SceneNode"), Some(InboundTopic::Scene));
        assert_eq!(InboundTopic::from_name("/PoseNode"), Some(InboundTopic::Pose));
        assert_eq!(InboundTopic::from_name("ControlNode"), None);
        assert_eq!(InboundTopic::Scene.spec().msg_type, "sensor_msgs/CompressedImage");
    }
}
