//! Controller side of the protocol, for simulators and test benches.
//! See [`NodeState`] for more details.

use log::trace;

use crate::buffer::Buffer;
use crate::frame::{encode_read_reply, encode_refusal, encode_write_reply, FrameBytes};
use crate::nom_parser::node::{parse_command, CommandToken};
use crate::types::{Address, Error as TypeError, IntoAddress, Parameter, Value};

const UNKNOWN_PARAMETER: u8 = 0x84;
const WRITE_REFUSED: u8 = 0x85;

/// Bus node (controller) part of the protocol
///
/// This enum represents the different states of the protocol.
///
/// Create a new protocol instance with `NodeState::new(address)`.
///
/// # Example
///
/// ```
/// use watlow_tpms::NodeState;
/// # use std::io::{Read, Write, Cursor};
/// # fn connect_serial_interface() -> Result<Cursor<Vec<u8>>,  &'static str>
/// # { Ok(Cursor::new(Vec::new())) }
/// #
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use watlow_tpms::Value;
/// let mut node = NodeState::new(1)?; // new controller instance with address 1
/// let mut serial = connect_serial_interface()?;
///
/// 'main: loop {
///        # break // this snippet is only for show
///        node = match node {
///            NodeState::ReceiveData(recv) => {
///                let mut buf = [0; 32];
///                match serial.read(&mut buf) {
///                    Ok(0) | Err(_) => break 'main,
///                    Ok(len) => recv.receive_data(&buf[..len]),
///                }
///            }
///
///            NodeState::SendData(mut send) => {
///                serial.write_all(send.get_data()).unwrap();
///                send.data_sent()
///            }
///
///            NodeState::ReadParameter(read_command) => {
///                if read_command.parameter() == 4001 {
///                    read_command.send_reply_ok(Value::Float32(72.5))
///                } else {
///                    read_command.send_invalid_parameter()
///                }
///            }
///
///            NodeState::WriteParameter(write_command) => write_command.write_ok(),
///        };
/// }
/// # Ok(()) }
///  ```
#[derive(Debug)]
pub enum NodeState {
    /// More data needs to be received from the bus. Use receive_data() on the inner struct.
    ReceiveData(ReceiveData),
    /// Data is waiting to be transmitted.
    SendData(SendData),
    /// A parameter read request from the bus master.
    ReadParameter(ReadParam),
    /// A parameter write request from the bus master.
    WriteParameter(WriteParam),
}

impl NodeState {
    /// Create a new protocol instance, accepting requests for the given address.
    /// Returns an error if the given address is invalid.
    pub fn new(address: impl IntoAddress) -> Result<Self, TypeError> {
        Ok(ReceiveData::new(address)?.into())
    }

    /// Do not send any reply to the master. Transition to the idle `ReceiveData` state instead.
    /// The master will wait until it times out and report `NoResponse`.
    pub fn no_reply(self) -> Self {
        match self {
            Self::ReceiveData(ReceiveData { state, .. })
            | Self::SendData(SendData { state, .. })
            | Self::ReadParameter(ReadParam { state, .. })
            | Self::WriteParameter(WriteParam { state, .. }) => ReceiveData::from_state(state),
        }
    }
}

impl From<ReceiveData> for NodeState {
    fn from(x: ReceiveData) -> Self {
        Self::ReceiveData(x)
    }
}

impl From<SendData> for NodeState {
    fn from(x: SendData) -> Self {
        Self::SendData(x)
    }
}

impl From<ReadParam> for NodeState {
    fn from(x: ReadParam) -> Self {
        Self::ReadParameter(x)
    }
}

impl From<WriteParam> for NodeState {
    fn from(x: WriteParam) -> Self {
        Self::WriteParameter(x)
    }
}

#[derive(Debug, Clone, Copy)]
struct CommonState {
    address: Address,
}

/// Struct with methods for the "receive data from bus" state.
#[derive(Debug)]
pub struct ReceiveData {
    state: CommonState,
    input_buffer: Buffer,
}

impl ReceiveData {
    /// Create a new bus node instance in the "receive" state without the `NodeState` wrapper.
    pub fn new(address: impl IntoAddress) -> Result<Self, TypeError> {
        Ok(Self {
            state: CommonState {
                address: address.into_address()?,
            },
            input_buffer: Buffer::new(),
        })
    }

    fn from_state(state: CommonState) -> NodeState {
        Self {
            state,
            input_buffer: Buffer::new(),
        }
        .into()
    }

    /// Feed data into the internal buffer, and try to parse the buffer afterwards.
    ///
    /// A state transition will occur if a complete request for our address has
    /// been received. Requests for other addresses and corrupt frames are dropped.
    pub fn receive_data(mut self, data: &[u8]) -> NodeState {
        self.input_buffer.write(data);
        self.parse_buffer()
    }

    fn parse_buffer(mut self) -> NodeState {
        use CommandToken::{ReadParameter, WriteParameter};

        loop {
            let (consumed, token) = parse_command(self.input_buffer.as_ref());
            if consumed == 0 {
                return self.need_data();
            }
            self.input_buffer.consume(consumed);
            match token {
                ReadParameter(address, parameter) if self.for_us(address) => {
                    return ReadParam::from_state(self.state, parameter)
                }
                WriteParameter(address, parameter, value) if self.for_us(address) => {
                    return WriteParam::from_state(self.state, parameter, value)
                }
                token => trace!("Node {} dropped {:?}", self.state.address, token),
            }
        }
    }

    fn need_data(self) -> NodeState {
        self.into()
    }

    fn for_us(&self, address: Address) -> bool {
        self.state.address == address
    }
}

/// Struct with methods for the "transmit data on bus" state.
///
/// Call [`get_data()`](Self::get_data()) to get a reference to the data to be transmitted,
/// and then call [`data_sent()`](Self::data_sent()) when the data has been successfully transmitted.
#[derive(Debug)]
pub struct SendData {
    state: CommonState,
    data: FrameBytes,
}

impl SendData {
    fn from_state(state: CommonState, data: FrameBytes) -> NodeState {
        Self { state, data }.into()
    }

    /// Returns the data to be sent on the bus.
    pub fn get_data(&mut self) -> &[u8] {
        self.data.as_ref()
    }

    /// Signals that the data was sent, and it's time to go back to the
    /// `ReceiveData` state.
    pub fn data_sent(self) -> NodeState {
        ReceiveData::from_state(self.state)
    }
}

/// Struct representing the "read request received" state.
#[derive(Debug)]
pub struct ReadParam {
    state: CommonState,
    parameter: Parameter,
}

impl ReadParam {
    fn from_state(state: CommonState, parameter: Parameter) -> NodeState {
        Self { state, parameter }.into()
    }

    /// Send a response to the master with the value of
    /// the parameter in the read request.
    pub fn send_reply_ok(self, value: Value) -> NodeState {
        let data = encode_read_reply(self.state.address, self.parameter, value);
        SendData::from_state(self.state, data)
    }

    /// Inform the master that the parameter in the request doesn't exist.
    pub fn send_invalid_parameter(self) -> NodeState {
        let data = encode_refusal(self.state.address, UNKNOWN_PARAMETER);
        SendData::from_state(self.state, data)
    }

    /// Do not send any reply to the master. Transition to the idle `ReceiveData` state instead.
    pub fn no_reply(self) -> NodeState {
        ReceiveData::from_state(self.state)
    }

    /// The address of this node.
    pub const fn address(&self) -> Address {
        self.state.address
    }

    /// The parameter whose value is to be returned.
    pub const fn parameter(&self) -> Parameter {
        self.parameter
    }
}

/// Struct representing the "write request received" state.
#[derive(Debug)]
pub struct WriteParam {
    state: CommonState,
    parameter: Parameter,
    value: Value,
}

impl WriteParam {
    fn from_state(state: CommonState, parameter: Parameter, value: Value) -> NodeState {
        Self {
            state,
            parameter,
            value,
        }
        .into()
    }

    /// Inform the master that the parameter was updated, echoing the new value.
    pub fn write_ok(self) -> NodeState {
        let data = encode_write_reply(self.state.address, self.parameter, self.value);
        SendData::from_state(self.state, data)
    }

    /// The parameter is read-only, or the value is refused.
    pub fn write_error(self) -> NodeState {
        let data = encode_refusal(self.state.address, WRITE_REFUSED);
        SendData::from_state(self.state, data)
    }

    /// Do not send any reply to the master. Transition to the idle `ReceiveData` state instead.
    pub fn no_reply(self) -> NodeState {
        ReceiveData::from_state(self.state)
    }

    /// The address of this node.
    pub const fn address(&self) -> Address {
        self.state.address
    }

    /// The parameter to be written.
    pub const fn parameter(&self) -> Parameter {
        self.parameter
    }

    /// The new value for the parameter.
    pub const fn value(&self) -> Value {
        self.value
    }
}
