//! Linux GPIO character-device input lines.

use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin};
use gpiocdev::line::{Bias, Offset, Value};
use gpiocdev::Request;
use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub struct PinError(gpiocdev::Error);

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for PinError {}

impl digital::Error for PinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One line requested as an input with the internal pull-up enabled.
pub struct CdevInput {
    request: Request,
    offset: Offset,
}

impl CdevInput {
    pub fn request(chip: &Path, offset: Offset) -> Result<Self, PinError> {
        let request = Request::builder()
            .on_chip(chip)
            .with_consumer("romgallery-relay")
            .with_line(offset)
            .as_input()
            .with_bias(Bias::PullUp)
            .request()
            .map_err(PinError)?;
        Ok(Self { request, offset })
    }
}

impl ErrorType for CdevInput {
    type Error = PinError;
}

impl InputPin for CdevInput {
    fn is_high(&mut self) -> Result<bool, PinError> {
        let value = self.request.value(self.offset).map_err(PinError)?;
        Ok(matches!(value, Value::Active))
    }

    fn is_low(&mut self) -> Result<bool, PinError> {
        self.is_high().map(|high| !high)
    }
}
