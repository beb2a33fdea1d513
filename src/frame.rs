//! Frame layout and the request builder.
//!
//! Every frame is a seven byte header, the header check byte, a data section
//! and a two byte data check:
//!
//! ```text
//! 55 FF | dir | zone/len fields (4) | hc | data ... | dc dc
//! ```
//!
//! Requests from the host have `dir == 0x05` and the zone byte at offset 3,
//! replies from a controller have `dir == 0x06` and the zone at offset 4.
//! Byte 6 is the length of the data section.

use arrayvec::ArrayVec;
use core::ops::Deref;

use crate::checksum::{data_check_bytes, header_check_byte, HEADER_LEN};
use crate::types::{Address, Parameter, Value, ValueType};

pub const PREAMBLE: [u8; 2] = [0x55, 0xff];
pub const DIR_REQUEST: u8 = 0x05;
pub const DIR_REPLY: u8 = 0x06;

/// Offset of the header check byte, and of the first data byte after it.
pub const HEADER_CHECK_POS: usize = HEADER_LEN;
pub const DATA_POS: usize = HEADER_LEN + 1;
/// Offset of the data section length inside the header.
pub const DATA_LEN_POS: usize = 6;

/// Smallest frame that carries both check fields.
pub const MIN_FRAME_LEN: usize = DATA_POS + 2;
/// Longest frame in the protocol, a Float32 read reply.
pub const MAX_FRAME_LEN: usize = 21;

pub(crate) type FrameBytes = ArrayVec<u8, MAX_FRAME_LEN>;

// Fixed data-section templates. `hi lo` is the parameter, `01` the instance.
pub(crate) const READ_SERVICE: [u8; 3] = [0x01, 0x03, 0x01];
pub(crate) const WRITE_SERVICE: [u8; 2] = [0x01, 0x04];
pub(crate) const INSTANCE: u8 = 0x01;
pub(crate) const FLOAT_TAG: [u8; 1] = [0x08];
pub(crate) const INTEGER_TAG: [u8; 2] = [0x0f, 0x01];

/// Total frame length announced by a header, if enough of it has arrived.
pub fn announced_len(header: &[u8]) -> Option<usize> {
    header
        .get(DATA_LEN_POS)
        .map(|len| MIN_FRAME_LEN + usize::from(*len))
}

/// Append the check fields to a header and data section.
pub(crate) fn encode_frame(header: [u8; HEADER_LEN], data: &[u8]) -> FrameBytes {
    let mut frame = FrameBytes::new();
    frame
        .try_extend_from_slice(&header)
        .expect("BUG: Frame buffer too small.");
    frame.push(header_check_byte(&header));
    frame
        .try_extend_from_slice(data)
        .expect("BUG: Frame buffer too small.");
    frame
        .try_extend_from_slice(&data_check_bytes(data))
        .expect("BUG: Frame buffer too small.");
    frame
}

fn request_header(address: Address, len_field: [u8; 3]) -> [u8; HEADER_LEN] {
    [
        PREAMBLE[0],
        PREAMBLE[1],
        DIR_REQUEST,
        address.to_zone(),
        len_field[0],
        len_field[1],
        len_field[2],
    ]
}

pub(crate) fn reply_header(address: Address, data_len: u8) -> [u8; HEADER_LEN] {
    [
        PREAMBLE[0],
        PREAMBLE[1],
        DIR_REPLY,
        0x00,
        address.to_zone(),
        0x00,
        data_len,
    ]
}

/// Append a tagged payload to a data section.
pub(crate) fn push_value(data: &mut ArrayVec<u8, 16>, value: Value) {
    let res = match value {
        Value::Float32(v) => data
            .try_extend_from_slice(&FLOAT_TAG)
            .and_then(|_| data.try_extend_from_slice(&v.to_be_bytes())),
        Value::Integer(v) => data
            .try_extend_from_slice(&INTEGER_TAG)
            .and_then(|_| data.try_extend_from_slice(&v.to_be_bytes())),
    };
    res.expect("BUG: Data buffer too small.");
}

/// A complete request, ready to be written to the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    data: FrameBytes,
    reply_len: usize,
}

impl RequestFrame {
    /// The frame bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.data.as_slice()
    }

    /// Length of the reply a controller sends to this request when the
    /// parameter exists and has the requested type.
    pub const fn expected_reply_len(&self) -> usize {
        self.reply_len
    }
}

impl Deref for RequestFrame {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for RequestFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Build a request reading `parameter` from the controller at `address`.
///
/// The value type doesn't appear in a read request, it only decides the
/// length of the reply.
pub fn build_read_request(
    address: Address,
    parameter: Parameter,
    value_type: ValueType,
) -> RequestFrame {
    let [hi, lo] = parameter.to_bytes();
    let mut data = ArrayVec::<u8, 16>::new();
    data.try_extend_from_slice(&READ_SERVICE)
        .and_then(|_| data.try_extend_from_slice(&[hi, lo, INSTANCE]))
        .expect("BUG: Data buffer too small.");

    RequestFrame {
        data: encode_frame(request_header(address, [0x00, 0x00, 0x06]), &data),
        reply_len: value_type.read_reply_len(),
    }
}

/// Build a request writing `value` to `parameter` on the controller at
/// `address`. The layout follows the type of `value`.
pub fn build_write_request(address: Address, parameter: Parameter, value: Value) -> RequestFrame {
    let [hi, lo] = parameter.to_bytes();
    let len_field = match value.value_type() {
        ValueType::Float32 => [0x00, 0x00, 0x0a],
        ValueType::Integer => [0x03, 0x00, 0x09],
    };
    let mut data = ArrayVec::<u8, 16>::new();
    data.try_extend_from_slice(&WRITE_SERVICE)
        .and_then(|_| data.try_extend_from_slice(&[hi, lo, INSTANCE]))
        .expect("BUG: Data buffer too small.");
    push_value(&mut data, value);

    RequestFrame {
        data: encode_frame(request_header(address, len_field), &data),
        reply_len: value.value_type().write_reply_len(),
    }
}

/// Reply to a read request, as sent by a controller.
pub(crate) fn encode_read_reply(address: Address, parameter: Parameter, value: Value) -> FrameBytes {
    let [hi, lo] = parameter.to_bytes();
    let mut data = ArrayVec::<u8, 16>::new();
    data.try_extend_from_slice(&[0x02, 0x03, 0x01, hi, lo, INSTANCE])
        .expect("BUG: Data buffer too small.");
    push_value(&mut data, value);
    encode_frame(reply_header(address, data.len() as u8), &data)
}

/// Reply to a write request, echoing the value now held by the parameter.
pub(crate) fn encode_write_reply(
    address: Address,
    parameter: Parameter,
    value: Value,
) -> FrameBytes {
    let [hi, lo] = parameter.to_bytes();
    let mut data = ArrayVec::<u8, 16>::new();
    data.try_extend_from_slice(&[0x02, 0x04, hi, lo, INSTANCE])
        .expect("BUG: Data buffer too small.");
    push_value(&mut data, value);
    encode_frame(reply_header(address, data.len() as u8), &data)
}

/// Short reply to a request the controller refuses. Controllers send `0x84`
/// for unknown parameters and `0x85` for rejected writes.
pub(crate) fn encode_refusal(address: Address, code: u8) -> FrameBytes {
    let data = [0x02, code];
    encode_frame(reply_header(address, data.len() as u8), &data)
}
