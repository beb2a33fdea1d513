//! Bus master (host) part of the protocol.
//!
//! [`Master`] is a sans-io state machine: it hands out request bytes and
//! consumes whatever the transport reads back. [`io::Master`] drives it over
//! a blocking `Read + Write` stream such as a serial port.

use log::debug;

use crate::buffer::Buffer;
use crate::frame::{
    announced_len, build_read_request, build_write_request, RequestFrame, MAX_FRAME_LEN, PREAMBLE,
};
use crate::response::{parse, ParsedResponse};
use crate::types::{Address, Error as TypeError, IntoAddress, Parameter, Value, ValueType};

/// Idle state of the master, talking to one controller address.
#[derive(Debug)]
pub struct Master {
    address: Address,
}

impl Master {
    /// Create a master for the controller at `address`.
    pub fn new(address: impl IntoAddress) -> Result<Self, TypeError> {
        Ok(Self {
            address: address.into_address()?,
        })
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    /// Read `parameter`, which holds a value of type `value_type`.
    pub fn read_parameter(self, parameter: Parameter, value_type: ValueType) -> SendData {
        let request = build_read_request(self.address, parameter, value_type);
        SendData {
            master: self,
            request,
        }
    }

    /// Write `value` to `parameter`.
    pub fn write_parameter(self, parameter: Parameter, value: Value) -> SendData {
        let request = build_write_request(self.address, parameter, value);
        SendData {
            master: self,
            request,
        }
    }
}

impl From<Address> for Master {
    fn from(address: Address) -> Self {
        Self { address }
    }
}

/// A request waiting to be transmitted.
///
/// Call [`as_slice()`](Self::as_slice()) to get the bytes, and
/// [`data_sent()`](Self::data_sent()) once they are on the bus.
#[derive(Debug)]
pub struct SendData {
    master: Master,
    request: RequestFrame,
}

impl SendData {
    pub fn as_slice(&self) -> &[u8] {
        self.request.as_slice()
    }

    pub fn request(&self) -> &RequestFrame {
        &self.request
    }

    /// The request was transmitted, start waiting for the reply.
    pub fn data_sent(self) -> ReceiveResponse {
        ReceiveResponse {
            master: self.master,
            buffer: Buffer::new(),
            expected_len: self.request.expected_reply_len(),
        }
    }
}

#[derive(Debug)]
pub enum ReceiverResult {
    /// The reply is incomplete, feed more data into the receiver.
    NeedData(ReceiveResponse),
    /// A complete reply was received and parsed.
    Done(Master, ParsedResponse),
}

/// Waiting for the reply from the controller.
#[derive(Debug)]
pub struct ReceiveResponse {
    master: Master,
    buffer: Buffer,
    expected_len: usize,
}

impl ReceiveResponse {
    /// Feed data read from the bus into the receiver.
    ///
    /// Bytes ahead of the frame preamble are dropped. The reply is complete
    /// when the length announced in its header has been received.
    pub fn receive_data(mut self, data: &[u8]) -> ReceiverResult {
        self.buffer.write(data);
        self.sync();
        match self.frame_len() {
            Some(len) if self.buffer.len() >= len => {
                let (master, response) = self.finish(len);
                ReceiverResult::Done(master, response)
            }
            _ => ReceiverResult::NeedData(self),
        }
    }

    /// The transport timed out or reached end of stream. Parse whatever
    /// has been received, which reports `NoResponse` if nothing was.
    pub fn timeout(self) -> (Master, ParsedResponse) {
        let len = self.buffer.len();
        self.finish(len)
    }

    fn finish(self, len: usize) -> (Master, ParsedResponse) {
        if len != self.expected_len {
            debug!(
                "Reply from address {} is {} bytes, expected {}",
                self.master.address, len, self.expected_len
            );
        }
        let response = parse(&self.buffer.as_ref()[..len], self.master.address);
        (self.master, response)
    }

    fn frame_len(&self) -> Option<usize> {
        announced_len(self.buffer.as_ref()).map(|len| len.min(MAX_FRAME_LEN))
    }

    // Drop leading bytes until the buffer starts with (part of) a preamble.
    fn sync(&mut self) {
        loop {
            let buf = self.buffer.as_ref();
            let skip = match buf.iter().position(|b| *b == PREAMBLE[0]) {
                Some(0) if buf.len() > 1 && buf[1] != PREAMBLE[1] => 1,
                Some(pos) => pos,
                None => buf.len(),
            };
            if skip == 0 {
                return;
            }
            self.buffer.consume(skip);
        }
    }
}

#[cfg(feature = "std")]
pub mod io {
    //! Blocking master over a `Read + Write` stream.

    use log::trace;
    use snafu::{ResultExt, Snafu};
    use std::io::{ErrorKind, Read, Write};

    use super::ReceiverResult;
    use crate::response::ParsedResponse;
    use crate::types::{Address, IntoAddress, IntoParameter, Value, ValueType};
    use crate::units::{celsius_to_fahrenheit, fahrenheit_to_celsius};
    use crate::{PROCESS_VALUE, SET_POINT};

    #[derive(Debug, Snafu)]
    #[non_exhaustive]
    pub enum Error {
        /// Writing the request to the stream failed.
        #[snafu(display("Failed to send request"))]
        Send { source: std::io::Error },
        /// Reading from the stream failed for a reason other than a timeout.
        #[snafu(display("Failed to receive reply"))]
        Receive { source: std::io::Error },
        /// An address, parameter or value was out of range.
        #[snafu(display("Invalid argument"))]
        Argument { source: crate::types::Error },
    }

    /// Talks to one controller over `IO`.
    ///
    /// Reads are expected to time out (or return end of stream) when the bus
    /// is idle, that is how a missing reply is detected. Several masters can
    /// share one port through `&mut` or a wrapper, one request at a time.
    ///
    /// ```
    /// use watlow_tpms::master::io::Master;
    /// # use std::io::Cursor;
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let serial = Cursor::new(Vec::new());
    /// let mut watlow = Master::new(serial, 1)?;
    /// let reply = watlow.read()?;
    /// match reply.value() {
    ///     Some(temp) => println!("Process value: {}", temp),
    ///     None => println!("No value: {:?}", reply.error()),
    /// }
    /// # Ok(()) }
    /// ```
    #[derive(Debug)]
    pub struct Master<IO> {
        address: Address,
        io: IO,
    }

    impl<IO> Master<IO>
    where
        IO: Read + Write,
    {
        pub fn new(io: IO, address: impl IntoAddress) -> Result<Self, Error> {
            Ok(Self {
                address: address.into_address().context(ArgumentSnafu)?,
                io,
            })
        }

        pub const fn address(&self) -> Address {
            self.address
        }

        pub fn into_inner(self) -> IO {
            self.io
        }

        /// Read a parameter of the given type.
        pub fn read_parameter(
            &mut self,
            parameter: impl IntoParameter,
            value_type: ValueType,
        ) -> Result<ParsedResponse, Error> {
            let parameter = parameter.into_parameter().context(ArgumentSnafu)?;
            let send = super::Master::from(self.address).read_parameter(parameter, value_type);
            self.transact(send)
        }

        /// Write a value to a parameter, the reply echoes the new value.
        pub fn write_parameter(
            &mut self,
            parameter: impl IntoParameter,
            value: Value,
        ) -> Result<ParsedResponse, Error> {
            let parameter = parameter.into_parameter().context(ArgumentSnafu)?;
            let send = super::Master::from(self.address).write_parameter(parameter, value);
            self.transact(send)
        }

        /// The current process value (parameter 4001).
        pub fn read(&mut self) -> Result<ParsedResponse, Error> {
            self.read_parameter(PROCESS_VALUE, ValueType::Float32)
        }

        /// The current set point (parameter 7001).
        pub fn read_setpoint(&mut self) -> Result<ParsedResponse, Error> {
            self.read_parameter(SET_POINT, ValueType::Float32)
        }

        /// Change the set point, in the controller's unit (Fahrenheit by default).
        pub fn write(&mut self, value: f64) -> Result<ParsedResponse, Error> {
            let value = Value::float(value).context(ArgumentSnafu)?;
            self.write_parameter(SET_POINT, value)
        }

        pub fn read_celsius(&mut self) -> Result<ParsedResponse, Error> {
            Ok(self.read()?.map_float(fahrenheit_to_celsius))
        }

        pub fn read_setpoint_celsius(&mut self) -> Result<ParsedResponse, Error> {
            Ok(self.read_setpoint()?.map_float(fahrenheit_to_celsius))
        }

        pub fn write_celsius(&mut self, celsius: f64) -> Result<ParsedResponse, Error> {
            Ok(self
                .write(celsius_to_fahrenheit(celsius))?
                .map_float(fahrenheit_to_celsius))
        }

        fn transact(&mut self, send: super::SendData) -> Result<ParsedResponse, Error> {
            trace!("Sending to address {}: {:02x?}", self.address, send.as_slice());
            self.io.write_all(send.as_slice()).context(SendSnafu)?;
            self.io.flush().context(SendSnafu)?;

            let mut receiver = send.data_sent();
            let mut buf = [0; 32];
            loop {
                let len = match self.io.read(&mut buf) {
                    Ok(len) => len,
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err)
                        if err.kind() == ErrorKind::TimedOut
                            || err.kind() == ErrorKind::WouldBlock =>
                    {
                        0
                    }
                    Err(err) => return Err(err).context(ReceiveSnafu),
                };
                if len == 0 {
                    let (_, response) = receiver.timeout();
                    return Ok(response);
                }
                trace!("Received from address {}: {:02x?}", self.address, &buf[..len]);
                receiver = match receiver.receive_data(&buf[..len]) {
                    ReceiverResult::NeedData(receiver) => receiver,
                    ReceiverResult::Done(_, response) => return Ok(response),
                };
            }
        }
    }
}
