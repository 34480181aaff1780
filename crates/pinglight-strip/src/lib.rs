#![cfg_attr(not(test), no_std)]

//! LED strip driver stack for the ping status light
//!
//! Architecture layers:
//! - `color` - Logical pixel colors in caller-facing channel order
//! - `family` - LED family descriptors ([`LedFamily`]): wire order, bit timing
//! - `buffer` - The pixel buffer every probe writes its slot into
//! - `pulse` - Bit-to-pulse-code encoding for the one-wire protocol
//! - `generator` - [`SignalGenerator`] over a hardware [`PulseChannel`]
//! - `controller` - [`StripController`], binds the family and pushes frames
//! - `shared` - [`SharedStrip`], the handle shared by all probe tasks
//! - `readiness` - IPv4/IPv6 readiness conditions probes wait on
//! - `probe` - Probe events, status colors and the probe session runner
//!
//! The stack is generic over `PulseChannel`, so the same code drives the
//! ESP32 RMT peripheral and the recording channels used in tests.

extern crate alloc;

pub mod buffer;
pub mod claims;
pub mod color;
pub mod controller;
pub mod error;
pub mod family;
pub mod generator;
pub mod probe;
pub mod pulse;
pub mod readiness;
pub mod shared;

pub use buffer::PixelBuffer;
pub use claims::{ChannelId, HardwareClaims, OutputPin};
pub use color::Color;
pub use controller::StripController;
pub use error::StripError;
pub use family::{BitTiming, LedFamily, WirePixel};
pub use generator::{ChannelError, GeneratorState, PulseChannel, SignalGenerator};
pub use probe::{
    EchoOutcome, EchoProber, ProbeError, ProbeEvent, ProbeSession, ProbeTarget, SessionConfig,
    StatusColors,
};
pub use pulse::{BitTicks, PulseCode};
pub use readiness::{AddressFamily, LinkState, NetworkReadiness};
pub use shared::{SharedStrip, StripOutput, StripSetup};
