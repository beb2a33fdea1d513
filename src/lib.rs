//! Sans-io implementation of the serial protocol spoken by Watlow PID
//! temperature controllers (EZ-Zone PM and friends) over RS-485.
//!
//! The protocol is a BACnet TP/MS derived, half-duplex request/reply
//! exchange. The host reads or writes numbered parameters, e.g. 4001 for the
//! process value and 7001 for the set point, and the controller replies with
//! a frame carrying a 16-bit integer or a 32-bit float.
//!
//! The crate is layered:
//!
//! * [`frame`] builds request frames, and [`response`] validates and decodes
//!   replies. Both are pure functions over byte slices.
//! * [`master::Master`] is a state machine for the host side that doesn't do
//!   any I/O itself, and [`master::io::Master`] drives it over a blocking
//!   `Read + Write` stream such as a serial port.
//! * [`NodeState`] is the controller side, for simulators and test benches.
//!
//! Serial settings are fixed: [`BAUD_RATE`] baud, 8 data bits, no parity.
//!
//! ```
//! use watlow_tpms::{addr, param, build_read_request, parse, ValueType};
//!
//! let request = build_read_request(addr(1), param(4001), ValueType::Float32);
//! assert_eq!(
//!     request.as_slice(),
//!     &[0x55, 0xff, 0x05, 0x10, 0x00, 0x00, 0x06, 0xe8,
//!       0x01, 0x03, 0x01, 0x04, 0x01, 0x01, 0xe3, 0x99]
//! );
//!
//! let reply = [
//!     0x55, 0xff, 0x06, 0x00, 0x11, 0x00, 0x0a, 0xee, 0x02, 0x04,
//!     0x07, 0x01, 0x01, 0x08, 0x42, 0xa0, 0x00, 0x00, 0x15, 0x79,
//! ];
//! let response = parse(&reply, addr(2));
//! assert_eq!(response.parameter(), Some(param(7001)));
//! assert_eq!(response.value().map(|v| v.as_f64()), Some(80.0));
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![forbid(unsafe_code)]

use core::time::Duration;

mod buffer;
pub mod checksum;
pub mod frame;
pub mod master;
mod nom_parser;
pub mod node;
pub mod response;
pub mod types;
pub mod units;

pub use frame::{build_read_request, build_write_request, RequestFrame};
pub use node::NodeState;
pub use response::{parse, validate, FrameShape, ParsedResponse, ResponseError};
pub use types::{addr, param, Address, Error, IntoAddress, IntoParameter, Parameter, Value, ValueType};
pub use units::{celsius_to_fahrenheit, fahrenheit_to_celsius};

/// Line speed of the controllers' standard bus port.
pub const BAUD_RATE: u32 = 38_400;

/// Read timeout after which a missing reply is reported as `NoResponse`.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);

/// The process value, i.e. the current temperature.
pub const PROCESS_VALUE: Parameter = param(4001);

/// The closed loop set point.
pub const SET_POINT: Parameter = param(7001);
