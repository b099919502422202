//! The board state shared by the scanner, dispatcher and transmitter.

use crate::config::Config;
use crate::leds::{BLANK, Blink, Frame, LedBuffer};
use crate::pad::Debouncer;
use crate::time::TimeInstant;
use crate::transmitter::{PulseGenerator, Transmitter};

/// Everything the bus master can change or query, in one place.
///
/// The device is owned by the main loop. LED edits are staged in the
/// [`LedBuffer`] and have no effect on the ring until a commit latches them
/// into the committed frame. Blinking alternates between that frame and
/// black, so staged edits never leak out on a phase flip.
#[derive(Debug, Clone)]
pub struct Device<I: TimeInstant> {
    config: Config,
    leds: LedBuffer,
    blink: Blink<I>,
    pad: Debouncer<I>,
    committed: Frame,
    commit_pending: bool,
    in_flight: bool,
}

impl<I: TimeInstant> Device<I> {
    /// Creates a device in its power-on state.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            leds: LedBuffer::new(&config),
            blink: Blink::new(&config),
            pad: Debouncer::new(config.debounce_ms),
            committed: BLANK,
            commit_pending: false,
            in_flight: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn leds(&self) -> &LedBuffer {
        &self.leds
    }

    pub fn leds_mut(&mut self) -> &mut LedBuffer {
        &mut self.leds
    }

    pub fn blink(&self) -> &Blink<I> {
        &self.blink
    }

    pub fn blink_mut(&mut self) -> &mut Blink<I> {
        &mut self.blink
    }

    pub fn pad(&self) -> &Debouncer<I> {
        &self.pad
    }

    pub fn pad_mut(&mut self) -> &mut Debouncer<I> {
        &mut self.pad
    }

    /// The frame the ring should show right now: the last committed frame,
    /// or black during the dark half of a blink cycle.
    pub fn frame(&self) -> Frame {
        if self.blink.is_lit() { self.committed } else { BLANK }
    }

    /// The frame latched by the last commit, ignoring the blink phase.
    pub fn committed_frame(&self) -> &Frame {
        &self.committed
    }

    /// Latches the staged LED state and queues it for transmission.
    ///
    /// Never touches the transmitter, so it is safe to call from the bus
    /// handler while a frame is on the wire. [`Device::service`] sends it.
    pub fn request_commit(&mut self) {
        self.committed = self.leds.frame(true);
        self.commit_pending = true;
    }

    /// Latches the staged LED state and sends it, or queues it if a frame
    /// is in flight.
    ///
    /// Returns true if the transmitter was armed.
    pub fn commit<P: PulseGenerator>(&mut self, transmitter: &mut Transmitter<P>) -> bool {
        self.request_commit();
        self.flush(transmitter)
    }

    /// Returns true if a commit is waiting for the transmitter.
    pub fn is_commit_pending(&self) -> bool {
        self.commit_pending
    }

    /// Main-loop housekeeping: advances blinking and sends queued commits.
    ///
    /// Only this and [`Device::commit`] touch the transmitter. While a frame
    /// is in flight the work is a single busy check; arming happens only
    /// once the line is idle.
    ///
    /// Returns true if the transmitter was armed.
    pub fn service<P: PulseGenerator>(&mut self, now: I, transmitter: &mut Transmitter<P>) -> bool {
        if self.blink.service(now) {
            self.commit_pending = true;
        }
        self.flush(transmitter)
    }

    fn flush<P: PulseGenerator>(&mut self, transmitter: &mut Transmitter<P>) -> bool {
        if transmitter.is_busy() {
            if self.commit_pending {
                trace!("commit queued, {} bits sent", transmitter.cursor());
            }
            return false;
        }
        if self.in_flight {
            self.in_flight = false;
            debug!("frame sent");
        }
        if !self.commit_pending {
            return false;
        }

        match transmitter.arm(&self.frame()) {
            Ok(()) => {
                trace!("frame armed");
                self.commit_pending = false;
                self.in_flight = true;
                true
            }
            Err(err) => {
                warn!("commit deferred: {}", err);
                false
            }
        }
    }

    /// Returns LEDs, blinking and debounce delay to their power-on values.
    ///
    /// The debounced key state and the committed frame are kept, since they
    /// mirror the physical keys and what the ring is showing. The cleared
    /// colors only reach the ring with the next commit.
    pub fn reset(&mut self) {
        if !self.blink.is_lit() {
            // Blink restarts lit; bring the committed frame back
            self.commit_pending = true;
        }
        self.leds = LedBuffer::new(&self.config);
        self.blink = Blink::new(&self.config);
        self.pad.set_debounce_delay(self.config.debounce_ms);
    }
}

impl<I: TimeInstant> Default for Device<I> {
    fn default() -> Self {
        Self::new(Config::DEFAULT)
    }
}
