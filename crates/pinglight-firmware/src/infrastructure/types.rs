use pinglight_strip::SharedStrip;

use crate::infrastructure::drivers::RmtPulseChannel;

pub(crate) type Strip = SharedStrip<RmtPulseChannel>;
