//! ADC access for the hall sensors
//!
//! RP2040 has a single ADC with 5 inputs:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29
//! - ADC4: Internal temperature sensor
//!
//! The clock only needs two of them, read with blocking conversions
//! (a conversion takes 2 µs, far below the sensor averaging delay).

use embassy_rp::adc::{Adc, Blocking, Channel};

use wheelclock_drivers::sensor::AdcReader;

/// Number of external ADC inputs the board can route to sensors
pub const MAX_INPUTS: usize = 4;

/// ADC input identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcInput {
    /// ADC0 on GPIO26
    Adc0,
    /// ADC1 on GPIO27
    Adc1,
    /// ADC2 on GPIO28
    Adc2,
    /// ADC3 on GPIO29
    Adc3,
}

impl AdcInput {
    /// GPIO pin for this input
    pub fn gpio(self) -> u8 {
        26 + self.index()
    }

    pub fn from_gpio(gpio: u8) -> Option<Self> {
        match gpio {
            26 => Some(AdcInput::Adc0),
            27 => Some(AdcInput::Adc1),
            28 => Some(AdcInput::Adc2),
            29 => Some(AdcInput::Adc3),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Blocking ADC with up to four routed inputs
///
/// Inputs are addressed by the index they were attached at, which is what
/// `HallSensors` passes to [`AdcReader::read`].
pub struct BlockingAdc<'d> {
    adc: Adc<'d, Blocking>,
    channels: [Option<Channel<'d>>; MAX_INPUTS],
}

impl<'d> BlockingAdc<'d> {
    pub fn new(adc: Adc<'d, Blocking>) -> Self {
        Self {
            adc,
            channels: [None, None, None, None],
        }
    }

    /// Route a pin channel to an input slot
    pub fn attach(&mut self, input: AdcInput, channel: Channel<'d>) {
        self.channels[usize::from(input.index())] = Some(channel);
    }
}

impl AdcReader for BlockingAdc<'_> {
    fn read(&mut self, input: u8) -> Result<u16, ()> {
        let channel = self
            .channels
            .get_mut(usize::from(input))
            .and_then(Option::as_mut)
            .ok_or(())?;
        self.adc.blocking_read(channel).map_err(|_| ())
    }
}
