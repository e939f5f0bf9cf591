//! Driver for multiplexed seven-segment displays on two cascaded 74HC595
//! shift registers.
//!
//! Only one digit is ever physically lit; a periodic timer interrupt walks
//! the digit positions fast enough that the whole bank appears steady.
//! Construction splits the driver into two halves sharing one static
//! [`FrameCell`]:
//!
//! * [`ShiftSegmentDisplay`], kept in thread context, renders numeric
//!   values into the frame;
//! * [`Scanner`], handed to the timer interrupt, drives one digit per tick
//!   over the data/clock/latch lines.
//!
//! The three lines are any `embedded-hal` output pins, so the driver runs
//! on AVR, RP2040, STM32 or ESP32 HALs unchanged, and against plain mock
//! pins on the host. See `demos/arduino-uno` for a complete ATmega328P
//! setup with Timer2 as the scan source.

#![no_std]

mod constants;
mod frame;
mod timing;
mod wiring;

pub use constants::{DEFAULT_SEGMENTS, DEFAULT_SELECTS, DIGITS};
pub use frame::FrameCell;
pub use timing::ScanTiming;
pub use wiring::{SegmentLines, Wiring};

use core::ops::Range;
use embedded_hal::digital::OutputPin;
use num_traits::ToPrimitive;

/// Errors reported by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The frame cell is already bound to another driver.
    FrameClaimed,
    /// A data, clock or latch line write failed.
    PinWrite,
    /// Numeric base outside 2..=16.
    InvalidBase(u8),
    /// Decimal-point index outside the addressed panel.
    InvalidDecimalPoint(u8),
    /// Value is negative or does not fit in 32 bits.
    InvalidValue,
}

/// A specialized `Result` for this crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Addressable slice of the digit bank.
///
/// The reference board carries two independently updatable four-digit
/// panels: `First` covers positions `0..N/2`, `Second` covers `N/2..N`.
/// `Whole` treats the bank as one panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Panel {
    First,
    Second,
    Whole,
}

impl Panel {
    fn positions(self, digits: usize) -> Range<usize> {
        match self {
            Self::First => 0..digits / 2,
            Self::Second => digits / 2..digits,
            Self::Whole => 0..digits,
        }
    }
}

/// Thread-context half of the driver: renders values into the shared
/// frame and answers diagnostics queries.
///
/// All methods take `&self`; the frame writes go through a critical
/// section, so the handle can be used anywhere in the application while
/// the scan interrupt is live.
pub struct ShiftSegmentDisplay<'a, const N: usize> {
    frame: &'a FrameCell<N>,
    patterns: [u16; 16],
    decimal_point: u16,
    blank: u16,
    timing: ScanTiming,
}

impl<'a, const N: usize> ShiftSegmentDisplay<'a, N> {
    /// Builds a driver over the given frame cell, output lines, wiring and
    /// scan timing, returning the render handle and the [`Scanner`] to be
    /// moved into the timer interrupt.
    ///
    /// The select masks are consumed before the segment patterns are
    /// derived: their union forces the select-line bits of every stored
    /// pattern high. The lines are parked low and the frame is blanked, so
    /// nothing lights until the first render call.
    ///
    /// # Errors
    ///
    /// [`Error::FrameClaimed`] if `frame` already backs another driver,
    /// [`Error::PinWrite`] if a line cannot be parked.
    pub fn new<DATA, CLK, LATCH>(
        frame: &'a FrameCell<N>,
        data: DATA,
        clock: CLK,
        latch: LATCH,
        wiring: Wiring<N>,
        timing: ScanTiming,
    ) -> Result<(Self, Scanner<'a, DATA, CLK, LATCH, N>)>
    where
        DATA: OutputPin,
        CLK: OutputPin,
        LATCH: OutputPin,
    {
        const { assert!(N > 0, "a display needs at least one digit") };

        if !frame.claim() {
            return Err(Error::FrameClaimed);
        }

        let segment_mask = wiring.segment_mask();
        let display = Self {
            frame,
            patterns: wiring.segments.pattern_table(segment_mask),
            decimal_point: wiring.segments.dp | segment_mask,
            blank: segment_mask,
            timing,
        };
        frame.fill(display.blank);

        let mut scanner = Scanner {
            data,
            clock,
            latch,
            selects: wiring.selects,
            frame,
            cursor: 0,
        };
        scanner.park_lines()?;

        Ok((display, scanner))
    }

    /// Renders `value` in `base` onto `panel`, optionally lighting the
    /// decimal point of the digit at panel-relative index `decimal_point`.
    ///
    /// Digits land most-significant first, without leading-zero
    /// suppression. A value needing more digits than the panel has loses
    /// its most-significant digits. The panel's buffer entries are
    /// replaced in one critical section; the scan interrupt sees either
    /// the old panel or the new one, never a mix.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidBase`], [`Error::InvalidDecimalPoint`] or
    /// [`Error::InvalidValue`]; the frame is untouched on error.
    pub fn set_value<T>(
        &self,
        panel: Panel,
        value: T,
        decimal_point: Option<u8>,
        base: u8,
    ) -> Result<()>
    where
        T: ToPrimitive,
    {
        if !(2..=16).contains(&base) {
            return Err(Error::InvalidBase(base));
        }
        let mut value = value.to_u32().ok_or(Error::InvalidValue)?;

        let positions = panel.positions(N);
        let width = positions.len();
        if let Some(index) = decimal_point {
            if usize::from(index) >= width {
                return Err(Error::InvalidDecimalPoint(index));
            }
        }

        // Patterns are assembled outside the critical section; only the
        // finished copy runs with the scan interrupt masked.
        let mut rendered = [0u16; N];
        for slot in (0..width).rev() {
            rendered[slot] = self.patterns[(value % u32::from(base)) as usize];
            value /= u32::from(base);
        }
        if let Some(index) = decimal_point {
            rendered[usize::from(index)] |= self.decimal_point;
        }

        self.frame.write(positions.start, &rendered[..width]);
        Ok(())
    }

    /// [`set_value`](Self::set_value) in base 10.
    pub fn set_decimal<T>(&self, panel: Panel, value: T, decimal_point: Option<u8>) -> Result<()>
    where
        T: ToPrimitive,
    {
        self.set_value(panel, value, decimal_point, 10)
    }

    /// [`set_value`](Self::set_value) in base 16.
    pub fn set_hex<T>(&self, panel: Panel, value: T, decimal_point: Option<u8>) -> Result<()>
    where
        T: ToPrimitive,
    {
        self.set_value(panel, value, decimal_point, 16)
    }

    /// Turns every stroke of `panel` off. The scan keeps running.
    pub fn clear(&self, panel: Panel) {
        let positions = panel.positions(N);
        let blank = [self.blank; N];
        self.frame.write(positions.start, &blank[..positions.len()]);
    }

    /// Computed full-display refresh rate in Hz.
    pub fn refresh_rate_hz(&self) -> u32 {
        self.timing.refresh_rate_hz(N as u32)
    }

    /// The scan-timer parameters this driver was built with.
    pub fn timing(&self) -> ScanTiming {
        self.timing
    }
}

/// Interrupt-context half of the driver: drives one digit per scan tick.
pub struct Scanner<'a, DATA, CLK, LATCH, const N: usize> {
    data: DATA,
    clock: CLK,
    latch: LATCH,
    selects: [u16; N],
    frame: &'a FrameCell<N>,
    cursor: usize,
}

impl<DATA, CLK, LATCH, const N: usize> Scanner<'_, DATA, CLK, LATCH, N>
where
    DATA: OutputPin,
    CLK: OutputPin,
    LATCH: OutputPin,
{
    /// Refreshes the digit under the scan cursor and advances to the next
    /// position, wrapping after `N`.
    ///
    /// Call once per scan-timer interrupt, after re-arming the counter
    /// with [`ScanTiming::reload`]. Runs to completion in bounded time. A
    /// suppressed tick skips one position for one cycle and the scan picks
    /// up where it left off; the cursor does not depend on how many ticks
    /// were missed.
    ///
    /// # Errors
    ///
    /// [`Error::PinWrite`] if a line write fails.
    pub fn refresh(&mut self) -> Result<()> {
        self.latch.set_low().map_err(|_| Error::PinWrite)?;

        // Select bits are active-high, segment bits active-low. The stored
        // pattern carries every select-line bit high, so one inversion
        // flips the strokes to wire polarity and clears the whole select
        // field, leaving the OR to raise exactly this digit's select bit.
        let word = self.selects[self.cursor] | !self.frame.word(self.cursor);

        // The register farthest down the chain ends up holding whatever
        // byte was shifted first, which makes it the high byte.
        self.shift_out((word >> 8) as u8)?;
        self.shift_out(word as u8)?;

        // Latch pulse: move the shifted word to the output drivers at once.
        self.latch.set_high().map_err(|_| Error::PinWrite)?;
        self.latch.set_low().map_err(|_| Error::PinWrite)?;

        self.cursor = (self.cursor + 1) % N;
        Ok(())
    }

    /// Shifts one byte out, most-significant bit first.
    fn shift_out(&mut self, byte: u8) -> Result<()> {
        for bit in (0..8).rev() {
            if byte & (1u8 << bit) != 0 {
                self.data.set_high().map_err(|_| Error::PinWrite)?;
            } else {
                self.data.set_low().map_err(|_| Error::PinWrite)?;
            }
            self.clock.set_high().map_err(|_| Error::PinWrite)?;
            self.clock.set_low().map_err(|_| Error::PinWrite)?;
        }
        Ok(())
    }

    fn park_lines(&mut self) -> Result<()> {
        self.data.set_low().map_err(|_| Error::PinWrite)?;
        self.clock.set_low().map_err(|_| Error::PinWrite)?;
        self.latch.set_low().map_err(|_| Error::PinWrite)
    }

    /// Releases the three output lines. The frame cell stays bound; use a
    /// fresh cell to build another driver.
    pub fn release(self) -> (DATA, CLK, LATCH) {
        (self.data, self.clock, self.latch)
    }
}
