#![allow(dead_code)]

use std::cell::RefCell;
use std::cmp::min;
use std::collections::VecDeque;
use std::io::{Error, ErrorKind, Write};
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering::SeqCst;
use std::sync::{Arc, Condvar, Mutex, Weak};
use std::time::Duration;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn frame(hex_str: &str) -> Vec<u8> {
    hex::decode(hex_str).expect("Test vector isn't valid hex")
}

/// Serial port stand-in with canned input. Reads past the end of the input
/// behave like a read timeout.
pub struct SerialInterface {
    rx: Vec<u8>,
    rx_pos: usize,
    tx: Vec<u8>,
    chunk_len: usize,
    do_read_error: bool,
    do_write_error: bool,
}

pub struct SerialIOPlane(Rc<RefCell<SerialInterface>>);

impl SerialIOPlane {
    pub fn new(serial_if: &Rc<RefCell<SerialInterface>>) -> SerialIOPlane {
        SerialIOPlane(serial_if.clone())
    }
}

impl SerialInterface {
    pub fn new(rx: &[u8]) -> Rc<RefCell<SerialInterface>> {
        Rc::new(RefCell::new(SerialInterface {
            rx: rx.to_vec(),
            rx_pos: 0,
            tx: Vec::new(),
            chunk_len: usize::MAX,
            do_read_error: false,
            do_write_error: false,
        }))
    }

    /// Queue more input, e.g. the reply to the next request.
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend_from_slice(data);
    }

    /// Deliver at most `len` bytes per read call.
    pub fn set_chunk_len(&mut self, len: usize) {
        self.chunk_len = len;
    }

    pub fn take_tx(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.tx)
    }

    pub fn trigger_write_error(&mut self) {
        self.do_write_error = true;
    }

    pub fn trigger_read_error(&mut self) {
        self.do_read_error = true;
    }
}

impl std::io::Read for SerialIOPlane {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.do_read_error {
            inner.do_read_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "IO read error"));
        }
        let old_pos = inner.rx_pos;
        if old_pos == inner.rx.len() {
            return Err(Error::new(ErrorKind::TimedOut, "IO read timeout"));
        }
        let want = min(buf.len(), inner.chunk_len);
        inner.rx_pos = min(old_pos + want, inner.rx.len());
        let len = inner.rx_pos - old_pos;
        buf[..len].copy_from_slice(&inner.rx[old_pos..inner.rx_pos]);
        Ok(len)
    }
}

impl std::io::Write for SerialIOPlane {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if inner.do_write_error {
            inner.do_write_error = false;
            Err(Error::new(ErrorKind::PermissionDenied, "IO write error"))
        } else {
            inner.tx.write(buf)
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

type BusT = Arc<Mutex<VecDeque<u8>>>;

/// Half-duplex RS-485 bus shared between threads. Everything a master sends
/// reaches every node, and everything a node sends reaches every master.
#[derive(Default)]
pub struct Rs485Bus {
    masters: Mutex<Vec<Weak<BusInterfaceLink>>>,
    nodes: Mutex<Vec<Weak<BusInterfaceLink>>>,
    master_data_available: Arc<Condvar>,
    node_data_available: Arc<Condvar>,
    eof: AtomicBool,
}

impl Rs485Bus {
    pub fn new() -> Arc<Rs485Bus> {
        Default::default()
    }

    /// Make blocked and future reads on all interfaces return end of stream.
    pub fn disconnect(&self) {
        self.eof.store(true, SeqCst);
        self.node_data_available.notify_all();
        self.master_data_available.notify_all();
    }

    pub fn new_master_interface(self: &Arc<Self>) -> BusInterface {
        let link = Arc::new(BusInterfaceLink {
            is_master: true,
            rx: Default::default(),
            rx_condvar: Arc::clone(&self.master_data_available),
        });
        self.masters.lock().unwrap().push(Arc::downgrade(&link));
        BusInterface::new(Arc::clone(self), link)
    }

    pub fn new_node_interface(self: &Arc<Self>) -> BusInterface {
        let link = Arc::new(BusInterfaceLink {
            is_master: false,
            rx: Default::default(),
            rx_condvar: Arc::clone(&self.node_data_available),
        });
        self.nodes.lock().unwrap().push(Arc::downgrade(&link));
        BusInterface::new(Arc::clone(self), link)
    }

    fn broadcast(links: &Mutex<Vec<Weak<BusInterfaceLink>>>, condvar: &Condvar, data: &[u8]) {
        let links = links.lock().unwrap();
        for link in links.iter().filter_map(Weak::upgrade) {
            link.rx.lock().unwrap().extend(data);
        }
        condvar.notify_all();
    }
}

pub struct BusInterface {
    bus: Arc<Rs485Bus>,
    link: Arc<BusInterfaceLink>,
    pub timeout: Duration,
    pub do_read_error: bool,
    pub do_write_error: bool,
}

struct BusInterfaceLink {
    is_master: bool,
    rx: BusT,
    rx_condvar: Arc<Condvar>,
}

impl BusInterface {
    fn new(bus: Arc<Rs485Bus>, link: Arc<BusInterfaceLink>) -> BusInterface {
        BusInterface {
            bus,
            link,
            timeout: Duration::from_millis(100),
            do_read_error: false,
            do_write_error: false,
        }
    }
}

impl std::io::Read for BusInterface {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            panic!("Testsuite called read with zero length buffer.")
        }
        if self.do_read_error {
            self.do_read_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "IO read error"));
        }

        let mut rx = self.link.rx.lock().expect("Read mutex is poisoned");
        if rx.is_empty() && !self.bus.eof.load(SeqCst) {
            rx = self
                .link
                .rx_condvar
                .wait_timeout(rx, self.timeout)
                .expect("Mutex lock failed")
                .0;
        }

        let len = min(buf.len(), rx.len());
        if len > 0 {
            for (dst, src) in buf.iter_mut().zip(rx.drain(..len)) {
                *dst = src;
            }
            Ok(len)
        } else if self.bus.eof.load(SeqCst) {
            Ok(0)
        } else {
            Err(Error::new(ErrorKind::TimedOut, "IO read timeout"))
        }
    }
}

impl std::io::Write for BusInterface {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.do_write_error {
            self.do_write_error = false;
            return Err(Error::new(ErrorKind::PermissionDenied, "IO write error"));
        }
        if self.link.is_master {
            Rs485Bus::broadcast(&self.bus.nodes, &self.bus.node_data_available, buf);
        } else {
            Rs485Bus::broadcast(&self.bus.masters, &self.bus.master_data_available, buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
