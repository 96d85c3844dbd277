use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target of a single-axis `Coord` command.
///
/// The controller accepts either one number (the value for axis `id`) or a
/// full coordinate vector, so the wire form is untagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordTarget {
    Scalar(f64),
    Vector(Vec<f64>),
}

impl From<f64> for CoordTarget {
    fn from(value: f64) -> Self {
        CoordTarget::Scalar(value)
    }
}

impl From<Vec<f64>> for CoordTarget {
    fn from(values: Vec<f64>) -> Self {
        CoordTarget::Vector(values)
    }
}

impl From<&[f64]> for CoordTarget {
    fn from(values: &[f64]) -> Self {
        CoordTarget::Vector(values.to_vec())
    }
}

/// Strict definition of the commands the arm controller accepts on
/// `ControlNode`.
///
/// Serialised with an internal `"tag"` field. The plural variants reuse the
/// singular field names (`angle`, `coord`) because that is what the
/// controller parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum ControlCommand {
    /// Move joint `id` to `angle` degrees.
    Angle { id: i64, angle: f64 },
    /// Move Cartesian axis `id` to `coord`.
    Coord { id: i64, coord: CoordTarget },
    /// Move every joint at once.
    Angles { angle: Vec<f64> },
    /// Move the end effector to a full Cartesian pose.
    Coords { coord: Vec<f64> },
    /// Set the gripper opening.
    Gripper { gripper: f64 },
}

impl ControlCommand {
    /// Wire tag of this command, e.g. `"Angle"`.
    pub fn tag(&self) -> &'static str {
        match self {
            ControlCommand::Angle { .. } => "Angle",
            ControlCommand::Coord { .. } => "Coord",
            ControlCommand::Angles { .. } => "Angles",
            ControlCommand::Coords { .. } => "Coords",
            ControlCommand::Gripper { .. } => "Gripper",
        }
    }

    /// Encode the command as the JSON text carried inside a `std_msgs/String`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serialization`] if any value is NaN or
    /// infinite; JSON would otherwise carry it as `null`.
    pub fn to_json(&self) -> Result<String, BridgeError> {
        if !self.is_finite() {
            return Err(BridgeError::Serialization(format!(
                "{} command contains a non-finite value",
                self.tag()
            )));
        }
        serde_json::to_string(self).map_err(|e| BridgeError::Serialization(e.to_string()))
    }

    /// `true` when every payload number is finite.
    fn is_finite(&self) -> bool {
        match self {
            ControlCommand::Angle { angle: v, .. }
            | ControlCommand::Coord { coord: CoordTarget::Scalar(v), .. }
            | ControlCommand::Gripper { gripper: v } => v.is_finite(),
            ControlCommand::Coord { coord: CoordTarget::Vector(vs), .. }
            | ControlCommand::Angles { angle: vs }
            | ControlCommand::Coords { coord: vs } => vs.iter().all(|v| v.is_finite()),
        }
    }
}

/// Robot pose as reported on `PoseNode`.
///
/// Both fields are optional so that a peer omitting one of them still
/// produces a usable record; the accessors report the gap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Joint angles in degrees, ordered from base to wrist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angle: Option<Vec<f64>>,
    /// Cartesian coordinates `[x, y, z, rx, ry, rz]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Vec<f64>>,
}

impl Pose {
    /// Parse the JSON text carried in a `PoseNode` message.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Parse`] when the text is not a JSON object or a
    /// field has the wrong shape.
    pub fn from_json(text: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(text).map_err(|e| BridgeError::Parse(format!("pose: {e}")))
    }

    pub fn angles(&self) -> Result<&[f64], BridgeError> {
        self.angle
            .as_deref()
            .ok_or(BridgeError::MissingField("angle"))
    }

    pub fn coords(&self) -> Result<&[f64], BridgeError> {
        self.coord
            .as_deref()
            .ok_or(BridgeError::MissingField("coord"))
    }
}

/// Error type for every fallible bridge operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    #[error("Connection Error: {0}")]
    Connection(String),

    #[error("Image Decode Error: {0}")]
    Decode(String),

    #[error("Parse Error: {0}")]
    Parse(String),

    #[error("Pose field missing: {0}")]
    MissingField(&'static str),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Bridge connection closed")]
    Disconnected,

    #[error("Bridge not ready after {0:?}")]
    ReadyTimeout(Duration),

    #[error("Runtime Error: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn wire(command: &ControlCommand) -> Value {
        serde_json::from_str(&command.to_json().unwrap()).unwrap()
    }

    #[test]
    fn angle_command_wire_shape() {
        let cmd = ControlCommand::Angle { id: 3, angle: 45.0 };
        assert_eq!(wire(&cmd), json!({"tag": "Angle", "id": 3, "angle": 45.0}));
    }

    #[test]
    fn coord_command_accepts_scalar_and_vector() {
        let scalar = ControlCommand::Coord { id: 1, coord: 120.5.into() };
        assert_eq!(wire(&scalar), json!({"tag": "Coord", "id": 1, "coord": 120.5}));

        let vector = ControlCommand::Coord {
            id: 2,
            coord: vec![1.0, 2.0].into(),
        };
        assert_eq!(
            wire(&vector),
            json!({"tag": "Coord", "id": 2, "coord": [1.0, 2.0]})
        );
    }

    #[test]
    fn plural_commands_reuse_singular_field_names() {
        let angles = ControlCommand::Angles {
            angle: vec![0.0, 10.0, -20.0, 0.0, 0.0, 45.0],
        };
        let v = wire(&angles);
        assert_eq!(v["tag"], "Angles");
        assert_eq!(v["angle"], json!([0.0, 10.0, -20.0, 0.0, 0.0, 45.0]));
        assert!(v.get("angles").is_none());

        let coords = ControlCommand::Coords {
            coord: vec![150.0, 0.0, 200.0, -180.0, 0.0, 0.0],
        };
        let v = wire(&coords);
        assert_eq!(v["tag"], "Coords");
        assert_eq!(v["coord"], json!([150.0, 0.0, 200.0, -180.0, 0.0, 0.0]));
    }

    #[test]
    fn gripper_command_wire_shape() {
        let cmd = ControlCommand::Gripper { gripper: 60.0 };
        assert_eq!(wire(&cmd), json!({"tag": "Gripper", "gripper": 60.0}));
        assert_eq!(cmd.tag(), "Gripper");
    }

    #[test]
    fn non_finite_values_are_rejected() {
        let commands = [
            ControlCommand::Angle { id: 3, angle: f64::NAN },
            ControlCommand::Coord { id: 1, coord: vec![1.0, f64::INFINITY].into() },
            ControlCommand::Angles { angle: vec![0.0, f64::NEG_INFINITY] },
            ControlCommand::Gripper { gripper: f64::NAN },
        ];
        for cmd in &commands {
            assert!(
                matches!(cmd.to_json(), Err(BridgeError::Serialization(ref m)) if m.contains(cmd.tag())),
                "{cmd:?} must not serialise"
            );
        }
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let result: Result<ControlCommand, _> =
            serde_json::from_str(r#"{"tag":"Teleport","x":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn pose_parses_both_fields() {
        let pose = Pose::from_json(r#"{"angle":[1,2,3],"coord":[4.5,5.5]}"#).unwrap();
        assert_eq!(pose.angles().unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(pose.coords().unwrap(), &[4.5, 5.5]);
    }

    #[test]
    fn pose_missing_coord_reports_missing_field() {
        let pose = Pose::from_json(r#"{"angle":[0,0,0,0,0,0]}"#).unwrap();
        assert!(pose.angles().is_ok());
        assert_eq!(pose.coords(), Err(BridgeError::MissingField("coord")));
    }

    #[test]
    fn pose_rejects_malformed_json() {
        assert!(matches!(Pose::from_json("{not json"), Err(BridgeError::Parse(_))));
        assert!(matches!(
            Pose::from_json(r#"{"angle":"north"}"#),
            Err(BridgeError::Parse(_))
        ));
    }

    #[test]
    fn bridge_error_display() {
        let err = BridgeError::MissingField("coord");
        assert!(err.to_string().contains("coord"));

        let err = BridgeError::Connection("ws://10.0.0.2:9090 refused".to_string());
        assert!(err.to_string().contains("Connection Error"));
    }
}
