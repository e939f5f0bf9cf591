//! Host-side stand-in for the 74HC595 pair: three output pins over one
//! shared bus. Data is sampled on rising shift-clock edges; a rising latch
//! edge copies the low 16 shifted bits to the output latches.
#![allow(dead_code)] // not every test binary reads the chain back

use core::convert::Infallible;
use embedded_hal::digital::{ErrorType, OutputPin};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Default)]
pub struct Chain {
    data: bool,
    clock: bool,
    latch: bool,
    shifter: u32,
    /// Every word transferred to the output latches, in order.
    pub latched: Vec<u16>,
}

pub type SharedChain = Rc<RefCell<Chain>>;

pub struct DataPin(SharedChain);
pub struct ClockPin(SharedChain);
pub struct LatchPin(SharedChain);

impl ErrorType for DataPin {
    type Error = Infallible;
}

impl OutputPin for DataPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().data = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().data = true;
        Ok(())
    }
}

impl ErrorType for ClockPin {
    type Error = Infallible;
}

impl OutputPin for ClockPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().clock = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut chain = self.0.borrow_mut();
        if !chain.clock {
            chain.shifter = (chain.shifter << 1) | u32::from(chain.data);
        }
        chain.clock = true;
        Ok(())
    }
}

impl ErrorType for LatchPin {
    type Error = Infallible;
}

impl OutputPin for LatchPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().latch = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut chain = self.0.borrow_mut();
        if !chain.latch {
            let word = chain.shifter as u16;
            chain.latched.push(word);
        }
        chain.latch = true;
        Ok(())
    }
}

pub fn chain() -> (SharedChain, DataPin, ClockPin, LatchPin) {
    let shared = Rc::new(RefCell::new(Chain::default()));
    (
        Rc::clone(&shared),
        DataPin(Rc::clone(&shared)),
        ClockPin(Rc::clone(&shared)),
        LatchPin(shared),
    )
}
