use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::combinator::{all_consuming, map, map_res};
use nom::number::complete::{be_f32, be_u16, u8};
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::Err::Incomplete;
use nom::IResult;

use crate::frame::{FLOAT_TAG, INSTANCE, INTEGER_TAG, READ_SERVICE, WRITE_SERVICE};
use crate::types::{Parameter, Value, ValueType};

type Buf = [u8];

/// Two byte parameter number.
pub(crate) fn parameter(buf: &Buf) -> IResult<&Buf, Parameter> {
    map_res(pair(u8, u8), |(hi, lo)| Parameter::from_bytes(hi, lo))(buf)
}

/// Untagged payload of the given type.
pub(crate) fn value<'a>(value_type: ValueType) -> impl Fn(&'a Buf) -> IResult<&'a Buf, Value> {
    move |buf| match value_type {
        ValueType::Integer => map(be_u16, Value::Integer)(buf),
        ValueType::Float32 => map(be_f32, Value::Float32)(buf),
    }
}

/// Payload preceded by its type tag, as in write requests and replies.
fn tagged_value(buf: &Buf) -> IResult<&Buf, Value> {
    alt((
        preceded(tag(&FLOAT_TAG[..]), value(ValueType::Float32)),
        preceded(tag(&INTEGER_TAG[..]), value(ValueType::Integer)),
    ))(buf)
}

pub(crate) mod node {
    use super::*;
    use nom::bytes::streaming::{tag as streaming_tag, take};
    use nom::combinator::{recognize, verify};
    use nom::number::streaming::u8 as streaming_u8;

    use crate::checksum::{data_check_bytes, header_check_byte, HEADER_LEN};
    use crate::frame::{DATA_LEN_POS, DIR_REQUEST, PREAMBLE};
    use crate::types::Address;
    use CommandToken::*;

    #[derive(PartialEq, Debug, Copy, Clone)]
    pub(crate) enum CommandToken {
        ReadParameter(Address, Parameter),
        WriteParameter(Address, Parameter, Value),
        /// A frame with valid checks that isn't a request we understand.
        Ignored,
        /// Bytes that don't start a valid frame.
        Invalid,
        NeedData,
    }

    /// Parse one request from the start of `buf`, returning the number of
    /// bytes consumed. Zero means more data is needed.
    pub(crate) fn parse_command(buf: &Buf) -> (usize, CommandToken) {
        match checked_frame(buf) {
            Ok((remaining, (header, data))) => {
                (buf.len() - remaining.len(), command(header, data))
            }
            Err(Incomplete(_)) => (0, NeedData),
            // Drop one byte and look for the next preamble
            Err(_) => (1, Invalid),
        }
    }

    fn checked_frame(buf: &Buf) -> IResult<&Buf, (&Buf, &Buf)> {
        let (buf, header) = recognize(preceded(
            streaming_tag(&PREAMBLE[..]),
            take(HEADER_LEN - PREAMBLE.len()),
        ))(buf)?;
        let mut header_bytes = [0; HEADER_LEN];
        header_bytes.copy_from_slice(header);
        let (buf, _) = verify(streaming_u8, |check: &u8| {
            *check == header_check_byte(&header_bytes)
        })(buf)?;
        let (buf, data) = take(header[DATA_LEN_POS])(buf)?;
        let (buf, _) = verify(take(2usize), |check: &Buf| {
            check == &data_check_bytes(data)[..]
        })(buf)?;
        Ok((buf, (header, data)))
    }

    fn command(header: &Buf, data: &Buf) -> CommandToken {
        if header[2] != DIR_REQUEST {
            return Ignored;
        }
        let address = match Address::from_zone(header[3]) {
            Ok(address) => address,
            Err(_) => return Ignored,
        };
        match all_consuming(alt((read_request, write_request)))(data) {
            Ok((_, RequestData::Read(parameter))) => ReadParameter(address, parameter),
            Ok((_, RequestData::Write(parameter, value))) => {
                WriteParameter(address, parameter, value)
            }
            Err(_) => Ignored,
        }
    }

    enum RequestData {
        Read(Parameter),
        Write(Parameter, Value),
    }

    fn read_request(buf: &Buf) -> IResult<&Buf, RequestData> {
        map(
            preceded(
                tag(&READ_SERVICE[..]),
                terminated(parameter, tag(&[INSTANCE][..])),
            ),
            RequestData::Read,
        )(buf)
    }

    fn write_request(buf: &Buf) -> IResult<&Buf, RequestData> {
        map(
            preceded(
                tag(&WRITE_SERVICE[..]),
                tuple((terminated(parameter, tag(&[INSTANCE][..])), tagged_value)),
            ),
            |(parameter, value)| RequestData::Write(parameter, value),
        )(buf)
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter() {
        assert_eq!(
            parameter(&[0x1a, 0x1d, 0xff]),
            Ok((&[0xff][..], Parameter::new(26029).unwrap()))
        );
        assert!(parameter(&[0x64, 0x00]).is_err());
        assert!(parameter(&[0x04]).is_err());
    }

    #[test]
    fn test_values() {
        assert_eq!(
            value(ValueType::Float32)(&[0x42, 0xa0, 0x00, 0x00][..]),
            Ok((&[][..], Value::Float32(80.0)))
        );
        assert_eq!(
            value(ValueType::Integer)(&[0x00, 0x3e][..]),
            Ok((&[][..], Value::Integer(62)))
        );
        assert_eq!(
            tagged_value(&[0x0f, 0x01, 0x00, 0x47]),
            Ok((&[][..], Value::Integer(71)))
        );
        assert_eq!(
            tagged_value(&[0x08, 0x42, 0xa2, 0x00, 0x00]),
            Ok((&[][..], Value::Float32(81.0)))
        );
        assert!(tagged_value(&[0x07, 0x00, 0x47]).is_err());
    }
}
