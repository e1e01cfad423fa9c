//! PWM-dimmed indicator LEDs

use embedded_hal::pwm::SetDutyCycle;

use wheelclock_core::traits::{IndicatorFrame, Indicators};

/// One LED on a PWM output, active high
pub struct PwmLed<P> {
    pwm: P,
    level: u8,
}

impl<P: SetDutyCycle> PwmLed<P> {
    /// Create an LED, initially dark
    pub fn new(pwm: P) -> Self {
        let mut led = Self { pwm, level: 0xFF };
        led.set_level(0);
        led
    }

    /// Set brightness, 0 = off, 255 = full
    pub fn set_level(&mut self, level: u8) {
        if level == self.level {
            return;
        }
        // Duty writes on the supported boards cannot fail
        let _ = self
            .pwm
            .set_duty_cycle_fraction(u16::from(level), u16::from(u8::MAX));
        self.level = level;
    }

    pub fn level(&self) -> u8 {
        self.level
    }
}

/// The clock's four indicator LEDs
pub struct LedBank<P> {
    pub status: PwmLed<P>,
    pub colon: PwmLed<P>,
    pub pm: PwmLed<P>,
    pub aux: PwmLed<P>,
}

impl<P: SetDutyCycle> LedBank<P> {
    pub fn new(status: P, colon: P, pm: P, aux: P) -> Self {
        Self {
            status: PwmLed::new(status),
            colon: PwmLed::new(colon),
            pm: PwmLed::new(pm),
            aux: PwmLed::new(aux),
        }
    }
}

impl<P: SetDutyCycle> Indicators for LedBank<P> {
    fn show(&mut self, frame: &IndicatorFrame) {
        self.status.set_level(frame.status);
        self.colon.set_level(frame.colon);
        self.pm.set_level(frame.pm);
        self.aux.set_level(frame.aux);
    }
}
