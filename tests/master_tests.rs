mod common;

use common::*;
use watlow_tpms::master::io::{self, Master};
use watlow_tpms::{addr, param, parse, FrameShape, ResponseError, Value, ValueType};

const READ_4001_ADDR1: &str = "55ff0510000006e8010301040101e399";
const FLOAT_READ_REPLY: &str = "55ff060010000b8802030104010108451e268c8b9e";
const SET_80F_ADDR1: &str = "55ff051000000aec01040701010842a000007c0d";
const SET_80F_REPLY: &str = "55ff060010000a7602040701010842a000001579";
const READ_80F_REPLY: &str = "55ff060010000b880203010401010842a00000746a";

#[test]
fn reply_vectors() {
    let write_reply = frame(SET_80F_REPLY);
    assert_eq!(FrameShape::detect(&write_reply), Some(FrameShape::FloatWrite));
    assert_eq!(parse(&write_reply, addr(1)).value(), Some(Value::Float32(80.0)));

    let read_reply = frame(READ_80F_REPLY);
    assert_eq!(FrameShape::detect(&read_reply), Some(FrameShape::FloatRead));
    assert_eq!(parse(&read_reply, addr(1)).value(), Some(Value::Float32(80.0)));
}

#[test]
fn master_read() {
    init_logging();
    let serial_sim = SerialInterface::new(&frame(FLOAT_READ_REPLY));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();

    let reply = master.read().unwrap();
    assert_eq!(serial_sim.borrow_mut().take_tx(), frame(READ_4001_ADDR1));
    assert_eq!(reply.address(), addr(1));
    assert_eq!(reply.parameter(), Some(param(4001)));
    assert_eq!(reply.value(), Some(Value::Float32(f32::from_bits(0x451e268c))));
}

#[test]
fn master_read_in_small_chunks() {
    init_logging();
    let serial_sim = SerialInterface::new(&frame(FLOAT_READ_REPLY));
    serial_sim.borrow_mut().set_chunk_len(3);
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();
    assert!(master.read().unwrap().value().is_some());
}

#[test]
fn master_write_setpoint() {
    init_logging();
    let reply = frame(SET_80F_REPLY);
    let serial_sim = SerialInterface::new(&reply);
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();

    let response = master.write(80.0).unwrap();
    assert_eq!(serial_sim.borrow_mut().take_tx(), frame(SET_80F_ADDR1));
    assert_eq!(response.parameter(), Some(param(7001)));
    assert_eq!(response.value(), Some(Value::Float32(80.0)));

    // 26.67 C is 80 F on the wire, the echo is converted back
    serial_sim.borrow_mut().push_rx(&reply);
    let response = master.write_celsius((80.0 - 32.0) * 5.0 / 9.0).unwrap();
    assert_eq!(serial_sim.borrow_mut().take_tx(), frame(SET_80F_ADDR1));
    assert!((response.value().unwrap().as_f64() - 26.6667).abs() < 0.001);
}

#[test]
fn master_read_celsius() {
    init_logging();
    let serial_sim = SerialInterface::new(&frame(READ_80F_REPLY));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();
    let response = master.read_celsius().unwrap();
    assert!((response.value().unwrap().as_f64() - 26.6667).abs() < 0.001);
}

#[test]
fn master_no_response() {
    init_logging();
    let serial_sim = SerialInterface::new(&[]);
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 2).unwrap();
    let response = master.read_setpoint().unwrap();
    assert_eq!(response.address(), addr(2));
    assert_eq!(response.parameter(), None);
    assert_eq!(response.error(), Some(ResponseError::NoResponse));
}

#[test]
fn master_reply_for_other_address() {
    init_logging();
    // a valid reply, but from controller 2
    let serial_sim = SerialInterface::new(&frame("55ff060011000b100203010701010842960000d3b0"));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();
    let response = master.read_setpoint().unwrap();
    assert_eq!(response.error(), Some(ResponseError::InvalidResponse));
    assert_eq!(response.value(), None);
}

#[test]
fn master_refused() {
    init_logging();
    let serial_sim = SerialInterface::new(&frame("55ff06001000028f0284dbfe"));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();
    let response = master.read_parameter(25030, ValueType::Float32).unwrap();
    assert_eq!(response.error(), Some(ResponseError::UnparseableResponse));
}

#[test]
fn master_integer_parameters() {
    init_logging();
    let serial_sim = SerialInterface::new(&frame("55ff060010000a760203010803010f01003e8385"));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();
    let response = master.read_parameter(8003, ValueType::Integer).unwrap();
    assert_eq!(response.value(), Some(Value::Integer(62)));

    serial_sim
        .borrow_mut()
        .push_rx(&frame("55ff06001000097702040803010f010047883b"));
    serial_sim.borrow_mut().take_tx();
    let response = master.write_parameter(8003, Value::Integer(71)).unwrap();
    assert_eq!(
        serial_sim.borrow_mut().take_tx(),
        frame("55ff05100300094601040803010f0100478fed")
    );
    assert_eq!(response.result(), Ok(Value::Integer(71)));
}

#[test]
fn master_io_errors() {
    init_logging();
    let serial_sim = SerialInterface::new(&frame(FLOAT_READ_REPLY));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 1).unwrap();

    serial_sim.borrow_mut().trigger_write_error();
    assert!(matches!(master.read(), Err(io::Error::Send { .. })));

    serial_sim.borrow_mut().trigger_read_error();
    assert!(matches!(master.read(), Err(io::Error::Receive { .. })));

    // the reply is still waiting in the port
    assert!(master.read().unwrap().value().is_some());
}

#[test]
fn master_argument_errors() {
    let serial_sim = SerialInterface::new(&[]);
    assert!(matches!(
        Master::new(SerialIOPlane::new(&serial_sim), 17),
        Err(io::Error::Argument { .. })
    ));
    let mut master = Master::new(SerialIOPlane::new(&serial_sim), 16).unwrap();
    assert!(matches!(
        master.read_parameter(4300, ValueType::Float32),
        Err(io::Error::Argument { .. })
    ));
    assert!(matches!(master.write(f64::NAN), Err(io::Error::Argument { .. })));
    assert!(serial_sim.borrow_mut().take_tx().is_empty());
}
