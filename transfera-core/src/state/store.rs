//! The single owned actuator state

use transfera_protocol::{
    DataSource, ParameterId, Reply, POSITION_END_STROKE_FLAG, POSITION_UNINITIALIZED,
    POSITION_VALUE_MASK, SEQ_MODULO,
};

use super::error::ErrorKind;
use super::hook::{HookState, HookTarget};
use super::motion::StallDetector;
use crate::config::timing::{READY_TIMER_HIGH, READY_TIMER_MID};
use crate::config::ControlParameters;

/// Highest protection recovery level
pub const MAX_PROTECTION_LEVEL: u8 = 2;

/// Latest parameter echo carried in a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParameterEcho {
    /// Raw 4-bit data id
    pub id: u8,
    pub value: i32,
}

impl ParameterEcho {
    /// True when this echo reports `id` set to `value`
    pub fn confirms(&self, id: ParameterId, value: i32) -> bool {
        self.id == id as u8 && self.value == value
    }
}

/// Everything known about the actuator
#[derive(Debug, Clone)]
pub struct ActuatorState {
    params: ControlParameters,

    // Telemetry from the last accepted reply
    position: u16,
    voltage_mv: u16,
    current_ma: i16,
    actuator_error: ErrorKind,
    reply_seq: u8,
    data_source: DataSource,
    data_id: u8,
    data: [u8; 4],
    frames_received: u32,

    // Derived
    stall: StallDetector,
    ready_timer: u32,

    // Decided locally
    error: ErrorKind,
    issued_seq: u8,
    protection_level: u8,
    ignore_protection: bool,
}

impl Default for ActuatorState {
    fn default() -> Self {
        Self::new(ControlParameters::default())
    }
}

impl ActuatorState {
    pub fn new(params: ControlParameters) -> Self {
        Self {
            params,
            position: POSITION_UNINITIALIZED,
            voltage_mv: 0,
            current_ma: 0,
            actuator_error: ErrorKind::None,
            reply_seq: 0,
            data_source: DataSource::Parameter,
            data_id: 0,
            data: [0; 4],
            frames_received: 0,
            stall: StallDetector::new(),
            ready_timer: 0,
            error: ErrorKind::None,
            // First issued number is 0
            issued_seq: SEQ_MODULO - 1,
            protection_level: 0,
            ignore_protection: false,
        }
    }

    /// Record one checksum-valid reply
    pub fn apply_reply(&mut self, reply: &Reply) {
        self.position = reply.position;
        self.voltage_mv = reply.voltage_mv;
        self.current_ma = reply.current_ma;
        self.stall.update(reply.position);

        self.actuator_error = ErrorKind::from_code(reply.error);
        self.set_error(self.actuator_error);

        self.reply_seq = reply.echo.seq;
        self.issued_seq = reply.echo.seq;

        self.data_source = reply.echo.source;
        self.data_id = reply.echo.data_id;
        self.data = reply.data;
        if reply.echo.source == DataSource::ReadyTimer {
            self.ready_timer = reply.data_u32();
            trace!("ready timer {}", self.ready_timer);
        }

        self.frames_received = self.frames_received.wrapping_add(1);
    }

    pub fn params(&self) -> &ControlParameters {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut ControlParameters {
        &mut self.params
    }

    pub fn homing_speed(&self) -> i16 {
        self.params.speeds.homing
    }

    pub fn closing_speed(&self) -> i16 {
        self.params.speeds.closing
    }

    pub fn opening_speed(&self) -> i16 {
        self.params.speeds.opening
    }

    pub fn set_homing_speed(&mut self, speed: i16) {
        self.params.speeds.homing = speed;
    }

    pub fn set_closing_speed(&mut self, speed: i16) {
        self.params.speeds.closing = speed;
    }

    pub fn set_opening_speed(&mut self, speed: i16) {
        self.params.speeds.opening = speed;
    }

    /// Configured position of a named target
    pub fn target_position(&self, target: HookTarget) -> u16 {
        target.position(&self.params.positions)
    }

    /// Raw position field, end-of-stroke flag included
    pub fn position(&self) -> u16 {
        self.position
    }

    /// Position without the end-of-stroke flag
    pub fn position_value(&self) -> u16 {
        self.position & POSITION_VALUE_MASK
    }

    pub fn voltage_mv(&self) -> u16 {
        self.voltage_mv
    }

    pub fn current_ma(&self) -> i16 {
        self.current_ma
    }

    pub fn velocity(&self) -> u16 {
        self.stall.velocity()
    }

    pub fn is_stopped(&self) -> bool {
        self.stall.is_stopped()
    }

    pub fn hook_state(&self) -> HookState {
        HookState::from_position(self.position, &self.params.positions)
    }

    /// Homed and inside the travel ranges
    ///
    /// The end-stroke flag maps to Closed even while the value is the
    /// uninitialized sentinel, so both are checked.
    pub fn is_position_known(&self) -> bool {
        self.hook_state().is_known() && self.position_value() != POSITION_UNINITIALIZED
    }

    /// End of stroke, counted only when standing still and not ignored
    pub fn is_at_end_stroke(&self) -> bool {
        self.position & POSITION_END_STROKE_FLAG != 0
            && !self.ignore_protection
            && self.is_stopped()
    }

    /// End of stroke far from home
    ///
    /// Needs a known position: while uninitialized the value is the sentinel.
    pub fn is_protection_triggered(&self) -> bool {
        let value = self.position_value();
        self.is_at_end_stroke()
            && value != POSITION_UNINITIALIZED
            && value > self.params.protection_threshold
    }

    /// Latched error
    pub fn error(&self) -> ErrorKind {
        self.error
    }

    /// Error field of the last reply, unlatched
    pub fn actuator_error(&self) -> ErrorKind {
        self.actuator_error
    }

    pub fn has_error(&self) -> bool {
        !self.error.is_none()
    }

    /// Latch `error` unless one is already latched
    pub fn set_error(&mut self, error: ErrorKind) {
        if self.error.is_none() && !error.is_none() {
            warn!("error latched: {:?}", error);
            self.error = error;
        }
    }

    /// Drop the latched error (acknowledge)
    pub fn clear_error(&mut self) {
        if !self.error.is_none() {
            info!("error cleared: {:?}", self.error);
        }
        self.error = ErrorKind::None;
    }

    /// Sequence number echoed in the last reply
    pub fn reply_seq(&self) -> u8 {
        self.reply_seq
    }

    /// Sequence number for the next move command
    ///
    /// Advances on every call and restarts from the echoed number whenever
    /// a reply arrives.
    pub fn next_seq_no(&mut self) -> u8 {
        self.issued_seq = (self.issued_seq + 1) % SEQ_MODULO;
        self.issued_seq
    }

    /// Parameter echo of the last reply, if it carried one
    pub fn parameter_echo(&self) -> Option<ParameterEcho> {
        match self.data_source {
            DataSource::Parameter => Some(ParameterEcho {
                id: self.data_id,
                value: i32::from_le_bytes(self.data),
            }),
            DataSource::ReadyTimer => None,
        }
    }

    /// Accepted replies since start-up (wraps)
    pub fn frames_received(&self) -> u32 {
        self.frames_received
    }

    /// Ready-for-lifting indication
    ///
    /// Each query while the timer runs steps it down one plateau.
    pub fn ready_for_lifting(&mut self) -> bool {
        if self.ready_timer == 0 {
            return false;
        }

        if self.ready_timer >= READY_TIMER_HIGH {
            self.ready_timer = READY_TIMER_MID;
        } else if self.ready_timer >= READY_TIMER_MID {
            self.ready_timer = 0;
        }
        debug!("ready for lifting, timer {}", self.ready_timer);
        true
    }

    pub fn protection_level(&self) -> u8 {
        self.protection_level
    }

    /// Escalate protection recovery one level (saturates)
    pub fn advance_protection(&mut self) -> u8 {
        self.protection_level = (self.protection_level + 1).min(MAX_PROTECTION_LEVEL);
        self.protection_level
    }

    /// Put the level back, e.g. after a recovery that did not take
    pub fn set_protection_level(&mut self, level: u8) {
        self.protection_level = level.min(MAX_PROTECTION_LEVEL);
    }

    pub fn ignore_protection(&self) -> bool {
        self.ignore_protection
    }

    pub fn set_ignore_protection(&mut self, ignore: bool) {
        self.ignore_protection = ignore;
    }

    /// Local view after homing: at home, protection back to normal
    pub fn reset_position(&mut self) {
        self.position = self.params.positions.home;
        self.protection_level = 0;
        self.ignore_protection = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transfera_protocol::CommandEcho;

    fn reply(position: u16, error: u8, seq: u8) -> Reply {
        Reply {
            frame_type: 1,
            voltage_mv: 24000,
            current_ma: 120,
            position,
            error,
            echo: CommandEcho {
                seq,
                source: DataSource::Parameter,
                data_id: 0,
            },
            data: [0; 4],
        }
    }

    #[test]
    fn test_initial_state() {
        let state = ActuatorState::default();
        assert_eq!(state.hook_state(), HookState::Uninitialized);
        assert!(!state.is_stopped());
        assert!(!state.has_error());
        assert_eq!(state.frames_received(), 0);
    }

    #[test]
    fn test_first_error_wins() {
        let mut state = ActuatorState::default();
        state.apply_reply(&reply(100, 3, 0));
        assert_eq!(state.error(), ErrorKind::Overload);

        state.apply_reply(&reply(100, 6, 0));
        assert_eq!(state.error(), ErrorKind::Overload);
        assert_eq!(state.actuator_error(), ErrorKind::EStop);

        state.set_error(ErrorKind::MotorJammed);
        assert_eq!(state.error(), ErrorKind::Overload);

        state.clear_error();
        state.apply_reply(&reply(100, 0, 0));
        assert_eq!(state.error(), ErrorKind::None);
    }

    #[test]
    fn test_seq_cycles_without_repeats() {
        let mut state = ActuatorState::default();
        let mut seen = [false; 8];
        for expected in 0..8 {
            let seq = state.next_seq_no();
            assert_eq!(seq, expected);
            assert!(!seen[seq as usize]);
            seen[seq as usize] = true;
        }
        assert_eq!(state.next_seq_no(), 0);
    }

    #[test]
    fn test_seq_follows_reply_echo() {
        let mut state = ActuatorState::default();
        state.apply_reply(&reply(100, 0, 6));
        assert_eq!(state.reply_seq(), 6);
        assert_eq!(state.next_seq_no(), 7);
        assert_eq!(state.next_seq_no(), 0);
    }

    #[test]
    fn test_end_stroke_requires_standstill() {
        let mut state = ActuatorState::default();
        state.apply_reply(&reply(0x8000 | 20, 0, 0));
        assert!(!state.is_at_end_stroke());
        assert_eq!(state.hook_state(), HookState::Closed);

        for _ in 0..11 {
            state.apply_reply(&reply(0x8000 | 20, 0, 0));
        }
        assert!(state.is_at_end_stroke());
        assert!(!state.is_protection_triggered());

        state.set_ignore_protection(true);
        assert!(!state.is_at_end_stroke());
    }

    #[test]
    fn test_protection_triggered_far_from_home() {
        let mut state = ActuatorState::default();
        for _ in 0..12 {
            state.apply_reply(&reply(0x8000 | 5000, 0, 0));
        }
        assert!(state.is_protection_triggered());
    }

    #[test]
    fn test_protection_ignores_uninitialized_position() {
        let mut state = ActuatorState::default();
        for _ in 0..12 {
            state.apply_reply(&reply(0x8000 | POSITION_UNINITIALIZED, 0, 0));
        }
        assert!(state.is_at_end_stroke());
        assert!(!state.is_protection_triggered());
    }

    #[test]
    fn test_ready_timer_staircase() {
        let mut state = ActuatorState::default();
        let mut timer = reply(100, 0, 0);
        timer.echo.source = DataSource::ReadyTimer;
        timer.data = 1500u32.to_le_bytes();
        state.apply_reply(&timer);

        assert!(state.parameter_echo().is_none());
        assert!(state.ready_for_lifting()); // 1500 -> 500
        assert!(state.ready_for_lifting()); // 500 -> 0
        assert!(!state.ready_for_lifting());
    }

    #[test]
    fn test_ready_timer_below_plateau_holds() {
        let mut state = ActuatorState::default();
        let mut timer = reply(100, 0, 0);
        timer.echo.source = DataSource::ReadyTimer;
        timer.data = 300u32.to_le_bytes();
        state.apply_reply(&timer);

        assert!(state.ready_for_lifting());
        assert!(state.ready_for_lifting());
    }

    #[test]
    fn test_parameter_echo() {
        let mut state = ActuatorState::default();
        let mut echo = reply(100, 0, 0);
        echo.echo.data_id = ParameterId::IgnoreSensor as u8;
        echo.data = 1i32.to_le_bytes();
        state.apply_reply(&echo);

        let param = state.parameter_echo().unwrap();
        assert!(param.confirms(ParameterId::IgnoreSensor, 1));
        assert!(!param.confirms(ParameterId::IgnoreSensor, 0));
    }

    #[test]
    fn test_position_known() {
        let mut state = ActuatorState::default();
        assert!(!state.is_position_known());

        state.apply_reply(&reply(0x8000 | 0x7FFF, 0, 0));
        assert_eq!(state.hook_state(), HookState::Closed);
        assert!(!state.is_position_known());

        state.apply_reply(&reply(0x8000 | 2, 0, 0));
        assert!(state.is_position_known());
        state.apply_reply(&reply(20000, 0, 0));
        assert!(!state.is_position_known());
    }

    #[test]
    fn test_protection_level_and_reset() {
        let mut state = ActuatorState::default();
        assert_eq!(state.advance_protection(), 1);
        assert_eq!(state.advance_protection(), 2);
        assert_eq!(state.advance_protection(), 2);
        state.set_ignore_protection(true);

        state.reset_position();
        assert_eq!(state.protection_level(), 0);
        assert!(!state.ignore_protection());
        assert_eq!(state.hook_state(), HookState::Closed);

        state.set_protection_level(7);
        assert_eq!(state.protection_level(), MAX_PROTECTION_LEVEL);
        state.set_protection_level(0);
        assert_eq!(state.protection_level(), 0);
    }
}
