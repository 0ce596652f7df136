//! GPIO outputs

use embassy_rp::gpio::{Level, Output};
use picowire_hal::gpio::OutputPin;

/// Push-pull output driven through embassy-rp
pub struct RpOutput<'d> {
    pin: Output<'d>,
}

impl<'d> RpOutput<'d> {
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }

    pub fn into_inner(self) -> Output<'d> {
        self.pin
    }
}

impl OutputPin for RpOutput<'_> {
    fn set_high(&mut self) {
        self.pin.set_high();
    }

    fn set_low(&mut self) {
        self.pin.set_low();
    }

    fn set_state(&mut self, high: bool) {
        self.pin.set_level(if high { Level::High } else { Level::Low });
    }

    fn is_set_high(&self) -> bool {
        self.pin.is_set_high()
    }
}
