// Register file stand-in for the device, used by the protocol tests. Every
// bus operation and every delay is logged in the order it happens.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use super::Transport;
use crate::register::{Register, REGISTER_COUNT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Read(u8),
    Write(u8, u8),
    ReadBlock(u8, usize),
    WriteBlock(u8, Vec<u8>),
    Delay(u32),
}

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct BusFault;

#[derive(Debug)]
struct State {
    registers: [u8; REGISTER_COUNT],
    status_reads: VecDeque<u8>,
    failing: Vec<u8>,
    log: Vec<Op>,
}

#[derive(Debug, Clone)]
pub struct FakeBus {
    state: Rc<RefCell<State>>,
}

#[derive(Debug, Clone)]
pub struct FakeDelay {
    state: Rc<RefCell<State>>,
}

impl FakeBus {
    pub fn new() -> FakeBus {
        FakeBus {
            state: Rc::new(RefCell::new(State {
                registers: [0u8; REGISTER_COUNT],
                status_reads: VecDeque::new(),
                failing: Vec::new(),
                log: Vec::new(),
            })),
        }
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay {
            state: self.state.clone(),
        }
    }

    pub fn set(&self, register: Register, value: u8) {
        self.state.borrow_mut().registers[register.addr() as usize] = value;
    }

    pub fn set_block(&self, register: Register, values: &[u8]) {
        let start = register.addr() as usize;
        self.state.borrow_mut().registers[start..start + values.len()].copy_from_slice(values);
    }

    pub fn get(&self, register: Register) -> u8 {
        self.state.borrow().registers[register.addr() as usize]
    }

    // Scripted values for the next reads of the status register. Once the
    // queue runs dry, reads fall back to the register file.
    pub fn queue_status(&self, values: &[u8]) {
        self.state.borrow_mut().status_reads.extend(values.iter().copied());
    }

    // Every transaction that starts at `address` fails from now on.
    pub fn fail(&self, address: u8) {
        self.state.borrow_mut().failing.push(address);
    }

    pub fn log(&self) -> Vec<Op> {
        self.state.borrow().log.clone()
    }

    pub fn writes(&self) -> Vec<Op> {
        self.log()
            .into_iter()
            .filter(|op| matches!(op, Op::Write(..) | Op::WriteBlock(..)))
            .collect()
    }

    pub fn delays(&self) -> usize {
        self.log()
            .iter()
            .filter(|op| matches!(op, Op::Delay(_)))
            .count()
    }

    fn check(&self, address: u8) -> Result<(), BusFault> {
        if self.state.borrow().failing.contains(&address) {
            Err(BusFault)
        } else {
            Ok(())
        }
    }
}

impl Transport for FakeBus {
    type Error = BusFault;

    fn read_register(&mut self, address: u8) -> Result<u8, BusFault> {
        self.state.borrow_mut().log.push(Op::Read(address));
        self.check(address)?;

        let mut state = self.state.borrow_mut();
        if address == Register::Status.addr() {
            if let Some(value) = state.status_reads.pop_front() {
                return Ok(value);
            }
        }

        Ok(state.registers[address as usize])
    }

    fn write_register(&mut self, address: u8, value: u8) -> Result<(), BusFault> {
        self.state.borrow_mut().log.push(Op::Write(address, value));
        self.check(address)?;

        self.state.borrow_mut().registers[address as usize] = value;

        Ok(())
    }

    fn read_registers(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), BusFault> {
        self.state
            .borrow_mut()
            .log
            .push(Op::ReadBlock(address, buffer.len()));
        self.check(address)?;

        let start = address as usize;
        buffer.copy_from_slice(&self.state.borrow().registers[start..start + buffer.len()]);

        Ok(())
    }

    fn write_registers(&mut self, address: u8, values: &[u8]) -> Result<(), BusFault> {
        self.state
            .borrow_mut()
            .log
            .push(Op::WriteBlock(address, values.to_vec()));
        self.check(address)?;

        let start = address as usize;
        self.state.borrow_mut().registers[start..start + values.len()].copy_from_slice(values);

        Ok(())
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.state.borrow_mut().log.push(Op::Delay(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms.saturating_mul(1_000_000));
    }
}
