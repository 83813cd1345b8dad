//! # Simulator Protocol
//!
//! The simulator talks a socket.io style event protocol over a websocket. Every event message is
//! a text frame made of the two character control prefix `42` followed by a JSON array of the
//! form `[event_name, payload]`:
//!
//! ```text
//! 42["telemetry",{"ptsx":[...],"ptsy":[...],"x":1.0,"y":2.0,"psi":0.1,...}]
//! 42["steer",{"steering_angle":0.1,"throttle":0.3,...}]
//! 42["manual",{}]
//! ```
//!
//! A message with no payload (a `null` body or payload) means the simulator has no data for us,
//! which is answered with the manual driving frame.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod steer;
mod telemetry;

pub use steer::SteerCmd;
pub use telemetry::Telemetry;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use serde_json::Value;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Prefix of every event message. The `4` marks a websocket message and the `2` an event.
pub const EVENT_PREFIX: &str = "42";

/// Name of the event carrying vehicle telemetry.
pub const TELEMETRY_EVENT: &str = "telemetry";

/// Name of the event carrying steering demands.
pub const STEER_EVENT: &str = "steer";

/// Name of the event asking the simulator to hand control to the user.
pub const MANUAL_EVENT: &str = "manual";

/// The complete manual driving frame.
pub const MANUAL_FRAME: &str = "42[\"manual\",{}]";

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A decoded inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum SimFrame {
    /// The message is not an event message and must be ignored.
    NotEvent,

    /// An event message with no payload, the manual driving fallback applies.
    NoData,

    /// A telemetry event.
    Telemetry(Telemetry),

    /// Any other event, identified by name.
    Other(String),
}

/// Errors which can occur while decoding or encoding frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Frame contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("Frame envelope is invalid: {0}")]
    InvalidEnvelope(String),

    #[error("Payload of the {0:?} event is invalid: {1}")]
    InvalidPayload(String, serde_json::Error),

    #[error("Could not serialize the {0:?} event: {1}")]
    SerializationError(String, serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Decode a raw inbound text message.
///
/// The body is parsed structurally as JSON, only the first JSON value after the prefix is read so
/// any trailing framing characters are tolerated.
pub fn decode(raw: &str) -> Result<SimFrame, FrameError> {
    // Strip the control prefix, anything without one (or with nothing after it) isn't an event
    let body = match raw.strip_prefix(EVENT_PREFIX) {
        Some(b) if !b.trim().is_empty() => b,
        _ => return Ok(SimFrame::NotEvent)
    };

    // Parse the first value in the body
    let value = match serde_json::Deserializer::from_str(body)
        .into_iter::<Value>()
        .next()
    {
        Some(Ok(v)) => v,
        Some(Err(e)) => return Err(FrameError::InvalidJson(e)),
        None => return Ok(SimFrame::NotEvent)
    };

    let mut items = match value {
        Value::Null => return Ok(SimFrame::NoData),
        Value::Array(items) => items.into_iter(),
        other => return Err(FrameError::InvalidEnvelope(format!(
            "expected an array, found {}", other
        )))
    };

    let event = match items.next() {
        None => return Ok(SimFrame::NoData),
        Some(Value::String(s)) => s,
        Some(other) => return Err(FrameError::InvalidEnvelope(format!(
            "expected the event name to be a string, found {}", other
        )))
    };

    let payload = match items.next() {
        None | Some(Value::Null) => return Ok(SimFrame::NoData),
        Some(p) => p
    };

    match event.as_str() {
        TELEMETRY_EVENT => serde_json::from_value(payload)
            .map(SimFrame::Telemetry)
            .map_err(|e| FrameError::InvalidPayload(event, e)),
        _ => Ok(SimFrame::Other(event))
    }
}

/// Encode an outbound event with the given payload fields.
pub fn encode<T>(event: &str, fields: &T) -> Result<String, FrameError>
where
    T: Serialize
{
    let body = serde_json::to_string(&(event, fields))
        .map_err(|e| FrameError::SerializationError(event.into(), e))?;

    Ok(format!("{}{}", EVENT_PREFIX, body))
}

/// Encode a steering command as a `steer` event.
pub fn encode_steer(cmd: &SteerCmd) -> Result<String, FrameError> {
    encode(STEER_EVENT, cmd)
}

/// Encode the manual driving frame, handing control of the vehicle back to the user.
pub fn encode_manual() -> String {
    MANUAL_FRAME.to_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn telemetry_frame() -> String {
        format!(
            "42[\"telemetry\",{}]",
            json!({
                "ptsx": [1.0, 2.0, 3.0],
                "ptsy": [4.0, 5.0, 6.0],
                "x": 10.5,
                "y": -2.0,
                "psi": 0.25,
                "speed": 12.0,
                "steering_angle": -0.1,
                "throttle": 0.3
            })
        )
    }

    #[test]
    fn test_decode_telemetry() {
        let frame = decode(&telemetry_frame()).unwrap();

        let t = match frame {
            SimFrame::Telemetry(t) => t,
            f => panic!("Expected telemetry, got {:?}", f)
        };

        assert_eq!(t.waypoints_x_m, vec![1.0, 2.0, 3.0]);
        assert_eq!(t.waypoints_y_m, vec![4.0, 5.0, 6.0]);
        assert_eq!(t.pos_x_m, 10.5);
        assert_eq!(t.pos_y_m, -2.0);
        assert_eq!(t.heading_rad, 0.25);
        assert_eq!(t.speed, 12.0);
        assert_eq!(t.steering_ratio, -0.1);
        assert_eq!(t.throttle, 0.3);
        assert_eq!(t.num_waypoints(), Some(3));
        assert!(t.is_finite());
    }

    #[test]
    fn test_decode_tolerates_framing() {
        let raw = format!("{}  \n", telemetry_frame());
        assert!(matches!(decode(&raw), Ok(SimFrame::Telemetry(_))));
    }

    #[test]
    fn test_decode_no_data() {
        assert_eq!(decode("42null").unwrap(), SimFrame::NoData);
        assert_eq!(decode("42[]").unwrap(), SimFrame::NoData);
        assert_eq!(decode("42[\"telemetry\"]").unwrap(), SimFrame::NoData);
        assert_eq!(decode("42[\"telemetry\",null]").unwrap(), SimFrame::NoData);
    }

    #[test]
    fn test_null_text_inside_payload_is_data() {
        // The text "null" appearing inside a genuine payload must not trigger the fallback
        let raw = "42[\"note\",{\"msg\":\"null\"}]";
        assert_eq!(decode(raw).unwrap(), SimFrame::Other("note".into()));
    }

    #[test]
    fn test_decode_not_event() {
        assert_eq!(decode("").unwrap(), SimFrame::NotEvent);
        assert_eq!(decode("2").unwrap(), SimFrame::NotEvent);
        assert_eq!(decode("42").unwrap(), SimFrame::NotEvent);
        assert_eq!(decode("0{\"sid\":\"abc\"}").unwrap(), SimFrame::NotEvent);
        assert_eq!(decode("[\"telemetry\",{}]").unwrap(), SimFrame::NotEvent);
    }

    #[test]
    fn test_decode_other_event() {
        assert_eq!(
            decode("42[\"reset\",{}]").unwrap(),
            SimFrame::Other("reset".into())
        );
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("42[\"telemetry\",{"), Err(FrameError::InvalidJson(_))));
        assert!(matches!(decode("42{\"a\":1}"), Err(FrameError::InvalidEnvelope(_))));
        assert!(matches!(decode("42[7,{}]"), Err(FrameError::InvalidEnvelope(_))));
        assert!(matches!(
            decode("42[\"telemetry\",{\"ptsx\":[1.0]}]"),
            Err(FrameError::InvalidPayload(_, _))
        ));
    }

    #[test]
    fn test_encode_manual() {
        let frame = encode(MANUAL_EVENT, &json!({})).unwrap();
        assert_eq!(frame, MANUAL_FRAME);
        assert_eq!(frame, "42[\"manual\",{}]");
        assert_eq!(encode_manual(), frame);
    }

    #[test]
    fn test_encode_steer() {
        let cmd = SteerCmd {
            steering_angle: -0.5,
            throttle: 0.25,
            mpc_x: vec![1.0, 2.0],
            mpc_y: vec![0.0, 0.1],
            next_x: vec![2.0, 4.0, 6.0],
            next_y: vec![0.0, 0.0, 0.0],
        };

        let frame = encode_steer(&cmd).unwrap();
        assert!(frame.starts_with("42[\"steer\",{"));

        let value: Value = serde_json::from_str(&frame[2..]).unwrap();
        assert_eq!(value[0], STEER_EVENT);
        assert_eq!(value[1]["steering_angle"], -0.5);
        assert_eq!(value[1]["mpc_x"], json!([1.0, 2.0]));
        assert_eq!(value[1]["next_x"], json!([2.0, 4.0, 6.0]));

        let decoded: SteerCmd = serde_json::from_value(value[1].clone()).unwrap();
        assert_eq!(decoded, cmd);
    }
}
