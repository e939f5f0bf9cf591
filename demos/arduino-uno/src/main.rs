//! Eight digits on two 74HC595s, scanned from Timer2 on an Arduino Uno.
//!
//! Wiring: D11 -> SER of the first register, D13 -> SRCLK of both,
//! D8 -> RCLK of both; QH' of the first register feeds SER of the second.

#![no_std]
#![no_main]

use arduino_hal::hal::port::Dynamic;
use arduino_hal::port::{mode::Output, Pin};
use arduino_hal::prelude::*;
use avr_device::interrupt::{self, Mutex};
use core::cell::RefCell;
use panic_halt as _;
use shift7seg::{FrameCell, Panel, ScanTiming, Scanner, ShiftSegmentDisplay, Wiring, DIGITS};

type UnoScanner =
    Scanner<'static, Pin<Output, Dynamic>, Pin<Output, Dynamic>, Pin<Output, Dynamic>, DIGITS>;

static FRAME: FrameCell<DIGITS> = FrameCell::new();
static SCANNER: Mutex<RefCell<Option<UnoScanner>>> = Mutex::new(RefCell::new(None));

const TIMING: ScanTiming = ScanTiming::new(16_000_000, 1024, 240);

#[avr_device::interrupt(atmega328p)]
fn TIMER2_OVF() {
    // Re-arm first so the next tick lands one full period out.
    // SAFETY: only TCNT2 is touched; the handler owns Timer2's count.
    unsafe {
        avr_device::atmega328p::Peripherals::steal()
            .TC2
            .tcnt2()
            .write(|w| unsafe { w.bits(TIMING.reload) });
    }
    interrupt::free(|cs| {
        if let Some(scanner) = SCANNER.borrow(cs).borrow_mut().as_mut() {
            let _ = scanner.refresh();
        }
    });
}

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);
    let mut serial = arduino_hal::default_serial!(dp, pins, 57600);

    let data = pins.d11.into_output().downgrade();
    let clock = pins.d13.into_output().downgrade();
    let latch = pins.d8.into_output().downgrade();

    let (display, scanner) =
        ShiftSegmentDisplay::new(&FRAME, data, clock, latch, Wiring::default(), TIMING).unwrap();
    interrupt::free(|cs| SCANNER.borrow(cs).replace(Some(scanner)));

    // Timer2 free-running in normal mode with the /1024 prescaler,
    // overflow interrupt only.
    let tc2 = dp.TC2;
    tc2.tccr2a().reset();
    tc2.tccr2b().write(|w| w.cs2().prescale_1024());
    tc2.tcnt2().write(|w| unsafe { w.bits(TIMING.reload) });
    tc2.timsk2().write(|w| w.toie2().set_bit());

    // SAFETY: the scanner is parked in SCANNER before interrupts start.
    unsafe { interrupt::enable() };

    ufmt::uwriteln!(
        &mut serial,
        "full-display refresh: {} Hz",
        display.refresh_rate_hz()
    )
    .unwrap_infallible();

    let mut count: u32 = 0;
    loop {
        // Lower panel counts in decimal with a fixed point, upper in hex.
        display.set_decimal(Panel::First, count, Some(1)).unwrap();
        display.set_hex(Panel::Second, count, None).unwrap();
        count = count.wrapping_add(1);
        arduino_hal::delay_ms(250);
    }
}
