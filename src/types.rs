//! This module defines range-checked types for controller addresses, parameters
//! and values, meant to simplify correct usage of the API.

use snafu::{ensure, OptionExt, Snafu};

use core::convert::{TryFrom, TryInto};
use core::fmt;
use core::ops::Deref;

/// Error type for this module
#[derive(Debug, Snafu, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The value isn't a valid controller address.
    #[snafu(display("Invalid address"))]
    InvalidAddress,
    /// The value isn't a parameter number that fits the two-byte wire format.
    #[snafu(display("Invalid parameter"))]
    InvalidParameter,
    /// The value can't be packed into the payload of the declared type.
    #[snafu(display("Invalid value"))]
    InvalidValue,
}

const fn invalid_address() -> InvalidAddressSnafu {
    InvalidAddressSnafu
}

const fn invalid_parameter() -> InvalidParameterSnafu {
    InvalidParameterSnafu
}

const fn invalid_value() -> InvalidValueSnafu {
    InvalidValueSnafu
}

/// Address is a range-checked [1, 16] integer, the RS-485 address set in the
/// controller's setup menu.
///
/// ## Example
/// ```
/// use watlow_tpms::Address;
/// use std::convert::TryInto;
/// let addr = Address::new(1).unwrap();
/// let addr: Address = 2usize.try_into().unwrap();
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct Address(u8);

/// Create a new [`Address`], panics if it is out of range.
pub const fn addr(a: u8) -> Address {
    if a >= 1 && a <= 16 {
        return Address(a);
    }
    panic!("Invalid address.")
}

impl Address {
    /// Create a new address, checking that the address is in \[1, 16\].
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if `address` is out of range.
    pub fn new(address: impl TryInto<u8>) -> Result<Self, Error> {
        let address = address.try_into().ok().with_context(invalid_address)?;
        ensure!((1..=16).contains(&address), invalid_address());
        Ok(Self(address))
    }

    /// The zone byte carrying this address on the wire.
    ///
    /// The zone is `address + 9` written as two decimal digits, one per
    /// nibble, so address 1 is `0x10` and address 16 is `0x25`.
    pub const fn to_zone(self) -> u8 {
        let zone = self.0 + 9;
        (zone / 10) << 4 | zone % 10
    }

    /// Decode a zone byte, the inverse of [`to_zone()`](Self::to_zone()).
    /// # Errors
    /// Returns [`Error::InvalidAddress`] if either nibble isn't a decimal digit,
    /// or the zone doesn't map to an address in range.
    pub fn from_zone(zone: u8) -> Result<Self, Error> {
        let (tens, ones) = (zone >> 4, zone & 0x0f);
        ensure!(tens <= 9 && ones <= 9, invalid_address());
        let zone = tens * 10 + ones;
        Self::new(zone.checked_sub(9).with_context(invalid_address)?)
    }
}

impl Deref for Address {
    type Target = u8;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<usize> for Address {
    fn eq(&self, other: &usize) -> bool {
        self.0 as usize == *other
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait to convert `T: TryInto<u8>` into an [`Address`].
pub trait IntoAddress {
    /// Convert self to an Address.
    /// # Errors
    /// Returns `Error:InvalidAddress` if self isn't a valid address.
    fn into_address(self) -> Result<Address, Error>;
}

impl IntoAddress for Address {
    fn into_address(self) -> Result<Address, Error> {
        Ok(self)
    }
}

impl<T> IntoAddress for T
where
    T: TryInto<u8>,
{
    fn into_address(self) -> Result<Address, Error> {
        Address::new(self)
    }
}

impl TryFrom<usize> for Address {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}


/// `Parameter` is a controller register number in the notation of the user
/// manual, e.g. 4001 for the process value or 7001 for the set point.
///
/// On the wire a parameter is two bytes: the thousands and the remainder of
/// the number. Valid parameters are at most 99999 with a remainder of at
/// most 255.
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Copy, Clone, Hash)]
#[repr(transparent)]
pub struct Parameter(u32);

/// Create a new [`Parameter`], panics if it is out of range.
pub const fn param(p: u32) -> Parameter {
    if p <= 99_999 && p % 1000 <= 255 {
        Parameter(p)
    } else {
        panic!("Invalid parameter.")
    }
}

impl Parameter {
    /// Create a new `Parameter`, checking that it fits the two-byte wire
    /// format.
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if `parameter` is out of range.
    pub fn new(parameter: impl TryInto<u32>) -> Result<Self, Error> {
        let parameter = parameter.try_into().ok().with_context(invalid_parameter)?;
        ensure!(
            parameter <= 99_999 && parameter % 1000 <= 255,
            invalid_parameter()
        );
        Ok(Self(parameter))
    }

    /// Wire form, e.g. 4001 becomes `[0x04, 0x01]` and 26029 becomes `[0x1a, 0x1d]`.
    pub const fn to_bytes(self) -> [u8; 2] {
        [(self.0 / 1000) as u8, (self.0 % 1000) as u8]
    }

    /// Decode the wire form. The number is the decimal digits of `hi` followed
    /// by `lo` zero-padded to three digits.
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if the result is above 99999.
    pub fn from_bytes(hi: u8, lo: u8) -> Result<Self, Error> {
        Self::new(u32::from(hi) * 1000 + u32::from(lo))
    }
}

impl Deref for Parameter {
    type Target = u32;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq<usize> for Parameter {
    fn eq(&self, other: &usize) -> bool {
        self.0 as usize == *other
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trait to convert `T: TryInto<u32>` into a [`Parameter`].
pub trait IntoParameter {
    /// Convert `self` to `Parameter`.
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if `self` can't be converted.
    fn into_parameter(self) -> Result<Parameter, Error>;
}

impl IntoParameter for Parameter {
    fn into_parameter(self) -> Result<Parameter, Error> {
        Ok(self)
    }
}

impl<T> IntoParameter for T
where
    T: TryInto<u32>,
{
    fn into_parameter(self) -> Result<Parameter, Error> {
        Parameter::new(self)
    }
}

impl TryFrom<usize> for Parameter {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}


/// The payload type of a parameter, as listed in the user manual.
///
/// Sending a request with the wrong type for a parameter makes the
/// controller answer with a frame of unexpected length, or not at all.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Unsigned 16-bit integer, used for enumerated settings (e.g. 62 = PID).
    Integer,
    /// 32-bit IEEE-754 float, used for temperatures and other measurements.
    Float32,
}

impl ValueType {
    /// Length of the controller's reply to a read request for this type.
    pub const fn read_reply_len(self) -> usize {
        match self {
            Self::Integer => 20,
            Self::Float32 => 21,
        }
    }

    /// Length of the controller's reply to a write request for this type.
    pub const fn write_reply_len(self) -> usize {
        match self {
            Self::Integer => 19,
            Self::Float32 => 20,
        }
    }
}

/// Value represents a parameter value carried in a frame payload.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Value {
    /// Sent as a big-endian u16.
    Integer(u16),
    /// Sent as a big-endian IEEE-754 single.
    Float32(f32),
}

impl Value {
    /// Create a float value from an `f64`, checking that it is finite
    /// as an `f32`.
    /// # Errors
    /// Returns [`Error::InvalidValue`] for NaN, infinities and values
    /// outside the `f32` range.
    pub fn float(value: f64) -> Result<Self, Error> {
        let single = value as f32;
        ensure!(single.is_finite(), invalid_value());
        Ok(Self::Float32(single))
    }

    /// Create an integer value, checking that it fits in 16 bits.
    /// # Errors
    /// Returns [`Error::InvalidValue`] if `value` is out of range.
    pub fn integer(value: impl TryInto<u16>) -> Result<Self, Error> {
        let value = value.try_into().ok().with_context(invalid_value)?;
        Ok(Self::Integer(value))
    }

    pub const fn value_type(self) -> ValueType {
        match self {
            Self::Integer(_) => ValueType::Integer,
            Self::Float32(_) => ValueType::Float32,
        }
    }

    /// The value as a float, integers convert losslessly.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Integer(v) => f64::from(v),
            Self::Float32(v) => f64::from(v),
        }
    }
}

impl From<u16> for Value {
    fn from(val: u16) -> Self {
        Self::Integer(val)
    }
}

impl From<f32> for Value {
    fn from(val: f32) -> Self {
        Self::Float32(val)
    }
}

impl PartialEq<u16> for Value {
    fn eq(&self, other: &u16) -> bool {
        matches!(self, Self::Integer(v) if v == other)
    }
}

impl PartialEq<f32> for Value {
    fn eq(&self, other: &f32) -> bool {
        matches!(self, Self::Float32(v) if v == other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float32(v) => write!(f, "{}", v),
        }
    }
}
