//! Timer subsystem: deadlines that become timeout events.
//!
//! The engine does not drive its own wall clock. It tracks deadlines and
//! reports how long until it next needs attention; an external driver
//! sleeps for that long and then pulses the machine.

mod clock;
mod store;

pub use clock::{deadline_after, Clock, ManualClock, SystemClock};
pub use store::{TimerStore, NO_TIMERS_PENDING};
