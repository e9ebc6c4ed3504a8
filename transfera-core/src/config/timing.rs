//! Tick budgets
//!
//! Every wait in the core is a count of ticks, never wall-clock time.

/// Period between two controller ticks (ms)
pub const TICK_PERIOD_MS: u32 = 25;

/// Receive ring buffer size (bytes)
pub const RX_BUFFER_LEN: usize = 1024;

/// Pending command slots
pub const COMMAND_QUEUE_LEN: usize = 8;

/// Velocity below this (counts per reply) is treated as standing still
pub const STALL_NOISE_THRESHOLD: u16 = 5;

/// Low-velocity samples needed before the actuator counts as stopped
pub const STALL_SAMPLES: u8 = 10;

/// Delay after changing actuator parameters before moving
pub const SETTLE_TICKS: u32 = 4;

/// Any single command running longer than this is aborted (30 s)
pub const COMMAND_TIMEOUT_TICKS: u32 = 1200;

/// Hold-off after an overload during homing before trying again
pub const HOMING_GRACE_TICKS: u32 = 20;

/// Time a move gets to leave standstill before the jam watchdog arms
pub const MOVE_START_GRACE_TICKS: u32 = 40;

/// Wait for standstill after a stop before re-sending it
pub const STOP_WAIT_TICKS: u32 = 40;

/// Wait for the actuator to come back after a reboot
pub const REBOOT_WAIT_TICKS: u32 = 200;

/// Wait for the actuator to clear its error after an acknowledge
pub const EACK_WAIT_TICKS: u32 = 20;

/// Acknowledge attempts before giving up
pub const EACK_MAX_ATTEMPTS: u8 = 3;

/// Wait for a parameter echo after a read request
pub const VERIFY_WAIT_TICKS: u32 = 20;

/// Parameter read attempts before latching an error
pub const VERIFY_MAX_ATTEMPTS: u8 = 3;

/// Ready-for-lifting staircase: `>= HIGH` steps to `MID`, `>= MID` to zero
pub const READY_TIMER_HIGH: u32 = 1000;
pub const READY_TIMER_MID: u32 = 500;
