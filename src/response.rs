//! Validation and decoding of controller replies.
//!
//! Replies don't share one layout. Byte 6 (the data length) and a type tag
//! near the end of the frame select one of a handful of [`FrameShape`]s,
//! each with its own offsets for the parameter and the payload.

use log::{debug, trace};
use nom::combinator::all_consuming;
use snafu::Snafu;

use crate::checksum::{data_check_bytes, header_check_byte, HEADER_LEN};
use crate::frame::{DATA_POS, DIR_REPLY, DIR_REQUEST, HEADER_CHECK_POS, MIN_FRAME_LEN};
use crate::nom_parser::{parameter, value};
use crate::types::{Address, Parameter, Value, ValueType};

/// Why a reply didn't produce a value.
#[derive(Debug, Snafu, Clone, Copy, PartialEq, Eq)]
pub enum ResponseError {
    /// Nothing, or only zero bytes, arrived. The controller is off-line or
    /// nothing answers at the address.
    #[snafu(display("No response"))]
    NoResponse,
    /// A check field or the address didn't match. Line noise, or a reply
    /// from another controller.
    #[snafu(display("Invalid response"))]
    InvalidResponse,
    /// A valid frame of a shape that carries no value, e.g. the refusal sent
    /// for unknown parameters or writes to read-only parameters.
    #[snafu(display("Response could not be parsed"))]
    UnparseableResponse,
}

/// The decoded reply to one request.
///
/// Holds either a value or the reason there is none. The parameter is only
/// known when a value was decoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedResponse {
    address: Address,
    parameter: Option<Parameter>,
    value: Result<Value, ResponseError>,
}

impl ParsedResponse {
    fn failed(address: Address, error: ResponseError) -> Self {
        Self {
            address,
            parameter: None,
            value: Err(error),
        }
    }

    /// The address the reply was expected from.
    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn parameter(&self) -> Option<Parameter> {
        self.parameter
    }

    pub fn value(&self) -> Option<Value> {
        self.value.ok()
    }

    pub fn error(&self) -> Option<ResponseError> {
        self.value.err()
    }

    /// The value, or the error, as a `Result`.
    pub fn result(&self) -> Result<Value, ResponseError> {
        self.value
    }

    /// Apply `convert` to a float value, e.g. a temperature unit conversion.
    /// Integer values and errors are passed through.
    #[must_use]
    pub fn map_float(self, convert: impl FnOnce(f64) -> f64) -> Self {
        let value = match self.value {
            Ok(Value::Float32(v)) => Ok(Value::Float32(convert(f64::from(v)) as f32)),
            other => other,
        };
        Self { value, ..self }
    }
}

/// Reply layouts seen from the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameShape {
    /// Integer read reply, e.g. 8003 (heat algorithm).
    IntegerRead,
    /// Float write reply, echoing the new value, e.g. 7001 (set point).
    FloatWrite,
    /// Integer write reply, echoing the new value.
    IntegerWrite,
    /// Float read reply, e.g. 4001 (process value).
    FloatRead,
}

struct ShapeLayout {
    shape: FrameShape,
    /// Data length byte (offset 6).
    marker: u8,
    /// Type tag, and its distance from the end of the frame.
    tag: &'static [u8],
    tag_from_end: usize,
    parameter_at: usize,
    value_type: ValueType,
}

// Checked in order, the first match wins.
static SHAPES: [ShapeLayout; 4] = [
    ShapeLayout {
        shape: FrameShape::IntegerRead,
        marker: 0x0a,
        tag: &[0x0f, 0x01],
        tag_from_end: 6,
        parameter_at: 11,
        value_type: ValueType::Integer,
    },
    ShapeLayout {
        shape: FrameShape::FloatWrite,
        marker: 0x0a,
        tag: &[0x08],
        tag_from_end: 7,
        parameter_at: 10,
        value_type: ValueType::Float32,
    },
    ShapeLayout {
        shape: FrameShape::IntegerWrite,
        marker: 0x09,
        tag: &[],
        tag_from_end: 0,
        parameter_at: 10,
        value_type: ValueType::Integer,
    },
    ShapeLayout {
        shape: FrameShape::FloatRead,
        marker: 0x0b,
        tag: &[],
        tag_from_end: 0,
        parameter_at: 11,
        value_type: ValueType::Float32,
    },
];

impl ShapeLayout {
    fn matches(&self, frame: &[u8]) -> bool {
        let tag_at = match frame.len().checked_sub(self.tag_from_end) {
            Some(pos) => pos,
            None => return false,
        };
        frame.get(6) == Some(&self.marker)
            && frame.get(tag_at..tag_at + self.tag.len()) == Some(self.tag)
    }

    fn decode(&self, frame: &[u8]) -> Option<(Parameter, Value)> {
        let width = match self.value_type {
            ValueType::Integer => 2,
            ValueType::Float32 => 4,
        };
        let value_end = frame.len().checked_sub(2)?;
        let value_at = value_end.checked_sub(width)?;
        let (_, param) = parameter(frame.get(self.parameter_at..)?).ok()?;
        let (_, value) = all_consuming(value(self.value_type))(frame.get(value_at..value_end)?).ok()?;
        Some((param, value))
    }
}

impl FrameShape {
    /// Determine the shape of a reply from its marker bytes.
    pub fn detect(frame: &[u8]) -> Option<Self> {
        Self::layout_of(frame).map(|layout| layout.shape)
    }

    fn layout_of(frame: &[u8]) -> Option<&'static ShapeLayout> {
        SHAPES.iter().find(|layout| layout.matches(frame))
    }
}

/// The address in a frame's zone byte. Requests carry the zone at offset 3,
/// replies at offset 4.
pub fn frame_address(frame: &[u8]) -> Option<Address> {
    let zone_at = match *frame.get(2)? {
        DIR_REQUEST => 3,
        DIR_REPLY => 4,
        _ => return None,
    };
    Address::from_zone(*frame.get(zone_at)?).ok()
}

fn checks_match(frame: &[u8]) -> bool {
    if frame.len() < MIN_FRAME_LEN {
        return false;
    }
    let mut header = [0; HEADER_LEN];
    header.copy_from_slice(&frame[..HEADER_LEN]);
    let (data, check) = frame[DATA_POS..].split_at(frame.len() - MIN_FRAME_LEN);
    frame[HEADER_CHECK_POS] == header_check_byte(&header) && check == &data_check_bytes(data)[..]
}

/// Check both check fields and that the frame is addressed to `expected`.
pub fn validate(frame: &[u8], expected: Address) -> bool {
    checks_match(frame) && frame_address(frame) == Some(expected)
}

/// Decode a reply from the controller at `expected`.
pub fn parse(frame: &[u8], expected: Address) -> ParsedResponse {
    use ResponseError::*;

    if frame.iter().all(|b| *b == 0) {
        return ParsedResponse::failed(expected, NoResponse);
    }
    if !validate(frame, expected) {
        debug!("Invalid response at address {}: {:02x?}", expected, frame);
        return ParsedResponse::failed(expected, InvalidResponse);
    }

    let decoded = FrameShape::layout_of(frame).and_then(|layout| {
        trace!("Reply from address {} has shape {:?}", expected, layout.shape);
        layout.decode(frame)
    });
    match decoded {
        Some((parameter, value)) => ParsedResponse {
            address: expected,
            parameter: Some(parameter),
            value: Ok(value),
        },
        None => {
            debug!("Unparseable response at address {}: {:02x?}", expected, frame);
            ParsedResponse::failed(expected, UnparseableResponse)
        }
    }
}
