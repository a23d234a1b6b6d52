//! Button polling loop.
//!
//! Each cycle reads every bound line and forwards its level: a low line
//! (button closed to ground) presses the key, a high line releases it.
//! Levels are forwarded on every cycle, not only on edges.

use crate::error::RelayError;
use crate::keycode::Keycode;
use crate::report::KeySink;
use embedded_hal::digital::InputPin;
use std::convert::Infallible;
use std::thread;
use std::time::Duration;

/// One input line and the key it drives.
pub struct Binding<P> {
    pub line: u32,
    pub key: Keycode,
    pub pin: P,
}

impl<P> Binding<P> {
    pub fn new(line: u32, key: Keycode, pin: P) -> Self {
        Self { line, key, pin }
    }
}

pub struct Relay<P, K> {
    bindings: Vec<Binding<P>>,
    sink: K,
}

impl<P: InputPin, K: KeySink> Relay<P, K> {
    pub fn new(bindings: Vec<Binding<P>>, sink: K) -> Self {
        Self { bindings, sink }
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    /// Read every line once and forward its level. Returns how many keys are held.
    pub fn poll_once(&mut self) -> Result<usize, RelayError> {
        let mut held = 0;
        for binding in &mut self.bindings {
            let pressed = binding.pin.is_low().map_err(|e| RelayError::Pin {
                line: binding.line,
                reason: format!("{:?}", e),
            })?;
            if pressed {
                self.sink.press(binding.key)?;
                held += 1;
            } else {
                self.sink.release(binding.key)?;
            }
        }
        Ok(held)
    }

    /// Poll forever. A zero interval busy-polls. The first error ends the loop.
    pub fn run(&mut self, interval: Duration) -> Result<Infallible, RelayError> {
        log::info!(
            "Relaying {} buttons (interval {:?})",
            self.bindings.len(),
            interval
        );
        loop {
            let held = self.poll_once()?;
            log::trace!("{} keys held", held);
            if !interval.is_zero() {
                thread::sleep(interval);
            }
        }
    }
}
