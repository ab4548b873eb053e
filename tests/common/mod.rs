//! Simulated register-mapped I2C bus and recording delay shared by the
//! integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use unit_drivers::Address;

pub fn addr(raw: u8) -> Address {
    Address::new(raw).unwrap()
}

// ── Bus ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    NoAcknowledge,
    Timeout,
}

impl i2c::Error for SimError {
    fn kind(&self) -> ErrorKind {
        match self {
            SimError::NoAcknowledge => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            SimError::Timeout => ErrorKind::Other,
        }
    }
}

/// One bus transaction as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub address: u8,
    /// All written bytes of the transaction, concatenated.
    pub write: Vec<u8>,
    pub read_len: usize,
    pub ok: bool,
}

struct Device {
    registers: [u8; 256],
    pointer: u8,
    /// Writing this register moves the device to the written address.
    address_register: Option<u8>,
}

impl Device {
    fn new() -> Self {
        Self {
            registers: [0; 256],
            pointer: 0,
            address_register: None,
        }
    }
}

#[derive(Default)]
struct State {
    devices: BTreeMap<u8, Device>,
    log: Vec<Transfer>,
    /// Transactions left before injected failures start.
    healthy_left: Option<usize>,
    fault: Option<SimError>,
}

/// Cloneable handle to a simulated bus.
///
/// Each device is a 256-byte register file with a register pointer. The
/// first written byte of a transaction selects the pointer, further written
/// bytes are stored with auto-increment, and reads return bytes from the
/// pointer onwards. Absent addresses fail with `NoAcknowledge`.
#[derive(Clone, Default)]
pub struct SimBus(Rc<RefCell<State>>);

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_device(&self, address: u8) -> &Self {
        self.0.borrow_mut().devices.insert(address, Device::new());
        self
    }

    pub fn remove_device(&self, address: u8) {
        self.0.borrow_mut().devices.remove(&address);
    }

    pub fn has_device(&self, address: u8) -> bool {
        self.0.borrow().devices.contains_key(&address)
    }

    pub fn set_address_register(&self, address: u8, register: u8) {
        self.with_device(address, |d| d.address_register = Some(register));
    }

    pub fn set_register(&self, address: u8, register: u8, value: u8) {
        self.set_registers(address, register, &[value]);
    }

    pub fn set_registers(&self, address: u8, start: u8, values: &[u8]) {
        self.with_device(address, |d| {
            for (i, v) in values.iter().enumerate() {
                d.registers[start.wrapping_add(i as u8) as usize] = *v;
            }
        });
    }

    pub fn register(&self, address: u8, register: u8) -> u8 {
        self.registers(address, register, 1)[0]
    }

    pub fn registers(&self, address: u8, start: u8, len: usize) -> Vec<u8> {
        let state = self.0.borrow();
        let device = &state.devices[&address];
        (0..len)
            .map(|i| device.registers[start.wrapping_add(i as u8) as usize])
            .collect()
    }

    /// Let `n` more transactions succeed, then fail every following one
    /// with `error` until [`heal`](Self::heal).
    pub fn fail_after(&self, n: usize, error: SimError) {
        let mut state = self.0.borrow_mut();
        state.healthy_left = Some(n);
        state.fault = Some(error);
    }

    pub fn heal(&self) {
        let mut state = self.0.borrow_mut();
        state.healthy_left = None;
        state.fault = None;
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.0.borrow().log.clone()
    }

    pub fn transfer_count(&self) -> usize {
        self.0.borrow().log.len()
    }

    /// Bytes of every successful write-only transaction to `address`.
    pub fn writes(&self, address: u8) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .log
            .iter()
            .filter(|t| t.address == address && t.ok && t.read_len == 0)
            .map(|t| t.write.clone())
            .collect()
    }

    pub fn clear_log(&self) {
        self.0.borrow_mut().log.clear();
    }

    fn with_device(&self, address: u8, f: impl FnOnce(&mut Device)) {
        let mut state = self.0.borrow_mut();
        let device = state
            .devices
            .get_mut(&address)
            .unwrap_or_else(|| panic!("no simulated device at {address:#04x}"));
        f(device);
    }

    fn injected_fault(state: &mut State) -> Option<SimError> {
        match state.healthy_left {
            Some(0) => state.fault,
            Some(ref mut n) => {
                *n -= 1;
                None
            }
            None => None,
        }
    }
}

impl ErrorType for SimBus {
    type Error = SimError;
}

impl I2c for SimBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.0.borrow_mut();

        let mut entry = Transfer {
            address,
            write: Vec::new(),
            read_len: 0,
            ok: false,
        };
        for op in operations.iter() {
            match op {
                Operation::Write(bytes) => entry.write.extend_from_slice(bytes),
                Operation::Read(buf) => entry.read_len += buf.len(),
            }
        }

        let state = &mut *state;
        let result = match Self::injected_fault(state) {
            Some(error) => Err(error),
            None => match state.devices.get_mut(&address) {
                None => Err(SimError::NoAcknowledge),
                Some(device) => Ok(apply(device, operations)),
            },
        };

        if let Ok(Some(new)) = result {
            if let Some(device) = state.devices.remove(&address) {
                state.devices.insert(new, device);
            }
        }

        entry.ok = result.is_ok();
        state.log.push(entry);
        result.map(|_| ())
    }
}

/// Run `operations` against one register file. Returns the new address if
/// the device's address register was written.
fn apply(device: &mut Device, operations: &mut [Operation<'_>]) -> Option<u8> {
    let mut moved_to = None;
    let mut selected = false;
    for op in operations.iter_mut() {
        match op {
            Operation::Write(bytes) => {
                for b in bytes.iter() {
                    if !selected {
                        device.pointer = *b;
                        selected = true;
                        continue;
                    }
                    if device.address_register == Some(device.pointer) {
                        moved_to = Some(*b);
                    }
                    device.registers[device.pointer as usize] = *b;
                    device.pointer = device.pointer.wrapping_add(1);
                }
            }
            Operation::Read(buf) => {
                for slot in buf.iter_mut() {
                    *slot = device.registers[device.pointer as usize];
                    device.pointer = device.pointer.wrapping_add(1);
                }
            }
        }
    }
    moved_to
}

// ── Device presets ───────────────────────────────────────────────────

/// DFR0592 with matching product/version IDs and a re-address register.
pub fn dfr0592(bus: &SimBus, address: u8) {
    bus.add_device(address);
    bus.set_registers(address, 0x00, &[address, 0xDF, 0x10]);
    bus.set_address_register(address, 0x00);
}

/// M5Stack unit: firmware version at `0xFE`, own address at `0xFF`.
pub fn m5_unit(bus: &SimBus, address: u8) {
    bus.add_device(address);
    bus.set_registers(address, 0xFE, &[0x02, address]);
    bus.set_address_register(address, 0xFF);
}

/// PCA9685 in its power-on state.
pub fn pca9685(bus: &SimBus, address: u8) {
    bus.add_device(address);
    bus.set_registers(address, 0x00, &[0x11, 0x04, 0xE2, 0xE4, 0xE8, 0xE0]);
}

/// TCS3472 reporting `id`.
pub fn tcs3472(bus: &SimBus, address: u8, id: u8) {
    bus.add_device(address);
    bus.set_register(address, 0x80 | 0x12, id);
}

// ── Delay ────────────────────────────────────────────────────────────

#[derive(Default)]
struct DelayLog {
    total_ns: u64,
    ms_calls: Vec<u32>,
}

/// Cloneable `DelayNs` that records instead of sleeping.
#[derive(Clone, Default)]
pub struct SimDelay(Rc<RefCell<DelayLog>>);

impl SimDelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.0.borrow().total_ns / 1_000_000
    }

    /// Arguments of each `delay_ms` call, in order.
    pub fn ms_calls(&self) -> Vec<u32> {
        self.0.borrow().ms_calls.clone()
    }

    pub fn clear(&self) {
        let mut log = self.0.borrow_mut();
        log.total_ns = 0;
        log.ms_calls.clear();
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().total_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut log = self.0.borrow_mut();
        log.total_ns += u64::from(ms) * 1_000_000;
        log.ms_calls.push(ms);
    }
}
