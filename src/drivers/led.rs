//! Single-colour LED on any `embedded-hal` output pin.
//!
//! Works on a [`DigitalOut`](crate::adapters::hardware::DigitalOut) from
//! the hardware adapter or on any other `StatefulOutputPin`. The level
//! read back from the pin is the source of truth for [`Led::is_on`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::StatefulOutputPin;
use log::{debug, info};

use crate::device::Device;
use crate::error::Error;

pub struct Led<P: StatefulOutputPin> {
    name: String,
    pin: P,
}

impl<P: StatefulOutputPin> Led<P> {
    pub fn new(name: impl Into<String>, pin: P) -> Self {
        let name = name.into();
        info!("LED[{}]: ready", name);
        Self { name, pin }
    }

    pub fn on(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()?;
        debug!("LED[{}]: on", self.name);
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()?;
        debug!("LED[{}]: off", self.name);
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<(), P::Error> {
        self.pin.toggle()
    }

    pub fn is_on(&mut self) -> Result<bool, P::Error> {
        self.pin.is_set_high()
    }

    /// Flash `count` times: on for `on_ms`, then off for `on_ms`. Ends off.
    pub fn blink(&mut self, delay: &mut impl DelayNs, on_ms: u32, count: u32) -> Result<(), P::Error> {
        for _ in 0..count {
            self.pin.set_high()?;
            delay.delay_ms(on_ms);
            self.pin.set_low()?;
            delay.delay_ms(on_ms);
        }
        Ok(())
    }

    /// Give the pin back.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> Device for Led<P>
where
    P: StatefulOutputPin,
    P::Error: Into<Error>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn release(&mut self) -> crate::Result<()> {
        self.off().map_err(Into::into)
    }
}
