//! Host-side doubles for the strip and probe ports.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use pinglight_strip::{
    BitTicks, ChannelError, EchoOutcome, EchoProber, HardwareClaims, LedFamily, PulseChannel,
    PulseCode, SharedStrip, StripSetup,
};

pub const TICK_HZ: u32 = 40_000_000;

#[derive(Default)]
struct Recording {
    frames: Vec<Vec<PulseCode>>,
    failures: usize,
}

/// Pulse channel that keeps every emitted frame.
///
/// Clones share the same recording, so a test can keep one handle while the
/// strip owns the other.
#[derive(Clone, Default)]
pub struct RecordingChannel {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` sends abort.
    pub fn fail_next(&self, count: usize) {
        self.lock().failures = count;
    }

    pub fn frames(&self) -> Vec<Vec<PulseCode>> {
        self.lock().frames.clone()
    }

    pub fn frame_count(&self) -> usize {
        self.lock().frames.len()
    }

    pub fn last_frame(&self) -> Option<Vec<PulseCode>> {
        self.lock().frames.last().cloned()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.recording.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PulseChannel for RecordingChannel {
    fn tick_hz(&self) -> u32 {
        TICK_HZ
    }

    fn send(&mut self, codes: &[PulseCode]) -> Result<(), ChannelError> {
        let mut recording = self.lock();
        if recording.failures > 0 {
            recording.failures -= 1;
            return Err(ChannelError::Aborted);
        }
        recording.frames.push(codes.to_vec());
        Ok(())
    }
}

#[derive(Default)]
struct Occupancy {
    busy: AtomicBool,
    sends: AtomicUsize,
    overlaps: AtomicUsize,
}

/// Pulse channel that holds each send for a while and counts sends that
/// started while another one was still on the wire.
#[derive(Clone, Default)]
pub struct SlowChannel {
    occupancy: Arc<Occupancy>,
}

impl SlowChannel {
    pub const HOLD: Duration = Duration::from_millis(1);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn sends(&self) -> usize {
        self.occupancy.sends.load(Ordering::SeqCst)
    }

    pub fn overlaps(&self) -> usize {
        self.occupancy.overlaps.load(Ordering::SeqCst)
    }
}

impl PulseChannel for SlowChannel {
    fn tick_hz(&self) -> u32 {
        TICK_HZ
    }

    fn send(&mut self, _codes: &[PulseCode]) -> Result<(), ChannelError> {
        let occupancy = &self.occupancy;
        if occupancy.busy.swap(true, Ordering::SeqCst) {
            occupancy.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        std::thread::sleep(Self::HOLD);
        occupancy.sends.fetch_add(1, Ordering::SeqCst);
        occupancy.busy.store(false, Ordering::SeqCst);
        Ok(())
    }
}

/// Prober that plays back a fixed list of outcomes, then times out.
pub struct ScriptedProber {
    outcomes: VecDeque<EchoOutcome>,
    pub calls: usize,
}

impl ScriptedProber {
    pub fn new(outcomes: impl IntoIterator<Item = EchoOutcome>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            calls: 0,
        }
    }
}

impl EchoProber for ScriptedProber {
    async fn echo(&mut self) -> EchoOutcome {
        self.calls += 1;
        self.outcomes.pop_front().unwrap_or(EchoOutcome::Timeout)
    }
}

/// Strip on channel 0 / GPIO 27 backed by a recording channel.
pub fn recording_strip(
    family: LedFamily,
    length: usize,
) -> (SharedStrip<RecordingChannel>, RecordingChannel) {
    let channel = RecordingChannel::new();
    let setup = StripSetup {
        channel: pinglight_strip::ChannelId(0),
        pin: pinglight_strip::OutputPin(27),
        family,
        length,
    };
    let strip = SharedStrip::bring_up(&HardwareClaims::new(), setup, channel.clone())
        .expect("recording strip bring-up");
    (strip, channel)
}

/// Strip on channel 0 / GPIO 27 backed by a slow channel.
pub fn slow_strip(family: LedFamily, length: usize) -> (SharedStrip<SlowChannel>, SlowChannel) {
    let channel = SlowChannel::new();
    let setup = StripSetup {
        channel: pinglight_strip::ChannelId(0),
        pin: pinglight_strip::OutputPin(27),
        family,
        length,
    };
    let strip = SharedStrip::bring_up(&HardwareClaims::new(), setup, channel.clone())
        .expect("slow strip bring-up");
    (strip, channel)
}

pub fn ticks(family: LedFamily) -> BitTicks {
    BitTicks::from_timing(&family.timing(), TICK_HZ).expect("family timing fits 40 MHz")
}

/// Data bytes carried by a frame, read until the first non-bit code.
pub fn decode_frame(codes: &[PulseCode], ticks: &BitTicks) -> Vec<u8> {
    let bits: Vec<bool> = codes.iter().map_while(|code| ticks.bit(*code)).collect();
    bits.chunks_exact(8)
        .map(|byte| byte.iter().fold(0u8, |acc, bit| (acc << 1) | u8::from(*bit)))
        .collect()
}

/// Number of bit codes at the start of a frame.
pub fn data_bits(codes: &[PulseCode], ticks: &BitTicks) -> usize {
    codes.iter().take_while(|code| ticks.bit(**code).is_some()).count()
}
