//! Per-command state machines
//!
//! Every operation walks the same ordered states. Each step reads the
//! actuator state, may send motor commands, and returns the state for the
//! next tick. Waiting is a tick count held in the task; nothing blocks.
//!
//! A step that fails to send returns the link error and leaves the task
//! where it was, so the same step runs again on the next tick.

use transfera_hal::LinkTx;
use transfera_protocol::{ParameterId, POSITION_UNINITIALIZED};

use super::input::Operation;
use crate::config::timing::{
    EACK_MAX_ATTEMPTS, EACK_WAIT_TICKS, HOMING_GRACE_TICKS, MOVE_START_GRACE_TICKS,
    REBOOT_WAIT_TICKS, SETTLE_TICKS, STOP_WAIT_TICKS, VERIFY_MAX_ATTEMPTS, VERIFY_WAIT_TICKS,
};
use crate::config::CurrentMode;
use crate::motor::CommandEncoder;
use crate::state::{ActuatorState, ErrorKind, HookTarget};

/// Stop is sent at most this many times
const STOP_MAX_ATTEMPTS: u8 = 2;

/// Task states, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    Start,
    Setup,
    Action,
    Teardown,
    End,
    Finish,
}

/// One running operation
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandTask {
    operation: Operation,
    state: TaskState,
    /// Ticks since the task started
    timer: u32,
    /// Ticks spent in the current state
    wait: u32,
    /// Sends of the request being retried
    attempts: u8,
    /// `frames_received` when the last request went out
    frames_mark: u32,
    /// Homing is holding off after an overload
    in_grace: bool,
    /// Protection level before recovery escalated it
    prior_level: u8,
    /// Local ignore-protection before recovery set it
    prior_ignore: bool,
}

impl CommandTask {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            state: TaskState::Start,
            timer: 0,
            wait: 0,
            attempts: 0,
            frames_mark: 0,
            in_grace: false,
            prior_level: 0,
            prior_ignore: false,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Ticks since start
    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn is_finished(&self) -> bool {
        self.state == TaskState::Finish
    }

    /// Run one tick of this task
    pub fn step<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<TaskState, L::Error> {
        self.timer = self.timer.saturating_add(1);
        self.wait = self.wait.saturating_add(1);

        match self.operation {
            Operation::Homing => self.step_homing(state, encoder)?,
            Operation::Close | Operation::Mid | Operation::Open => {
                self.step_move(state, encoder)?
            }
            Operation::Eack => self.step_eack(state, encoder)?,
            Operation::Stop => self.step_stop(state, encoder)?,
            Operation::Reboot => self.step_reboot(state, encoder)?,
            Operation::EnableRecovery => self.step_enable_recovery(state, encoder)?,
            Operation::None => self.enter(TaskState::Finish),
        }

        Ok(self.state)
    }

    fn enter(&mut self, next: TaskState) {
        if next != self.state {
            trace!("{:?}: {:?} -> {:?}", self.operation, self.state, next);
        }
        self.state = next;
        self.wait = 0;
    }

    fn fresh_reply(&self, state: &ActuatorState) -> bool {
        state.frames_received() != self.frames_mark
    }

    fn step_homing<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<(), L::Error> {
        match self.state {
            TaskState::Start => {
                if state.ignore_protection() {
                    // Recovery left the end-stop sensor off
                    encoder.set_ignore_sensor(false)?;
                    state.set_ignore_protection(false);
                }
                if state.is_at_end_stroke() {
                    // Already home: only the end-stop fault needs clearing
                    encoder.eack()?;
                    state.clear_error();
                    self.enter(TaskState::Teardown);
                } else {
                    encoder.set_position_uninitialized()?;
                    self.enter(TaskState::Setup);
                }
            }
            TaskState::Setup => {
                let seq = state.next_seq_no();
                encoder.move_to(
                    state.target_position(HookTarget::Home),
                    state.homing_speed(),
                    seq,
                )?;
                self.enter(TaskState::Action);
            }
            TaskState::Action => {
                if self.in_grace {
                    if self.wait >= HOMING_GRACE_TICKS {
                        self.in_grace = false;
                        if state.is_at_end_stroke() {
                            self.enter(TaskState::Teardown);
                        } else {
                            self.enter(TaskState::Setup);
                        }
                    }
                } else if state.error() == ErrorKind::Overload {
                    info!("homing: overload, holding off");
                    encoder.eack()?;
                    state.clear_error();
                    self.in_grace = true;
                    self.enter(TaskState::Action);
                } else if state.is_protection_triggered() {
                    state.set_error(ErrorKind::ProtectionActivated);
                } else if state.is_at_end_stroke() {
                    self.enter(TaskState::Teardown);
                }
            }
            TaskState::Teardown => {
                if state.actuator_error().is_none() && !state.has_error() {
                    encoder.set_position_home()?;
                    self.enter(TaskState::End);
                }
            }
            TaskState::End => {
                encoder.set_ignore_sensor(false)?;
                state.reset_position();
                self.enter(TaskState::Finish);
            }
            TaskState::Finish => {}
        }
        Ok(())
    }

    fn step_move<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<(), L::Error> {
        let Some(target) = self.operation.target() else {
            self.enter(TaskState::Finish);
            return Ok(());
        };

        match self.state {
            TaskState::Start => {
                apply_current_profile(state, encoder)?;
                self.enter(TaskState::Setup);
            }
            TaskState::Setup => {
                if self.wait >= SETTLE_TICKS {
                    self.enter(TaskState::Action);
                }
            }
            TaskState::Action => {
                let position = state.target_position(target);
                let speed = match target {
                    HookTarget::Open => state.opening_speed(),
                    HookTarget::Mid if state.position_value() < position => state.opening_speed(),
                    _ => state.closing_speed(),
                };
                let seq = state.next_seq_no();
                encoder.move_to(position, speed, seq)?;
                self.enter(TaskState::End);
            }
            TaskState::Teardown => self.enter(TaskState::End),
            TaskState::End => {
                // Judged only at standstill: the end-stroke flag reads as
                // Closed while the hook is still settling against a stop
                if !state.is_stopped() {
                    return Ok(());
                }
                if state.is_protection_triggered() {
                    state.set_error(ErrorKind::ProtectionActivated);
                } else if state.hook_state() == target.reached_state() {
                    self.enter(TaskState::Finish);
                } else if self.wait > MOVE_START_GRACE_TICKS {
                    state.set_error(ErrorKind::MotorJammed);
                }
            }
            TaskState::Finish => {}
        }
        Ok(())
    }

    fn step_eack<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<(), L::Error> {
        match self.state {
            TaskState::Start | TaskState::Setup => {
                state.clear_error();
                encoder.eack()?;
                self.attempts = 1;
                self.frames_mark = state.frames_received();
                self.enter(TaskState::Action);
            }
            TaskState::Action => {
                if self.fresh_reply(state) && state.actuator_error().is_none() {
                    self.enter(TaskState::End);
                } else if self.wait >= EACK_WAIT_TICKS {
                    if self.attempts < EACK_MAX_ATTEMPTS {
                        debug!("eack: actuator still faulted, resending");
                        state.clear_error();
                        encoder.eack()?;
                        self.attempts += 1;
                        self.frames_mark = state.frames_received();
                        self.enter(TaskState::Action);
                    } else {
                        warn!("eack: actuator did not clear {:?}", state.actuator_error());
                        self.enter(TaskState::End);
                    }
                }
            }
            TaskState::Teardown => self.enter(TaskState::End),
            TaskState::End => {
                if state.actuator_error().is_none() {
                    state.clear_error();
                }
                self.enter(TaskState::Finish);
            }
            TaskState::Finish => {}
        }
        Ok(())
    }

    fn step_stop<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<(), L::Error> {
        match self.state {
            TaskState::Start | TaskState::Setup => {
                encoder.stop()?;
                self.attempts = 1;
                self.enter(TaskState::Action);
            }
            TaskState::Action => {
                if state.is_stopped() {
                    self.enter(TaskState::Finish);
                } else if self.wait >= STOP_WAIT_TICKS {
                    if self.attempts < STOP_MAX_ATTEMPTS {
                        debug!("stop: still moving, resending");
                        encoder.stop()?;
                        self.attempts += 1;
                        self.enter(TaskState::Action);
                    } else {
                        warn!("stop: no standstill confirmed");
                        self.enter(TaskState::Finish);
                    }
                }
            }
            TaskState::Teardown | TaskState::End => self.enter(TaskState::Finish),
            TaskState::Finish => {}
        }
        Ok(())
    }

    fn step_reboot<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<(), L::Error> {
        match self.state {
            TaskState::Start | TaskState::Setup => {
                encoder.reboot()?;
                self.frames_mark = state.frames_received();
                self.enter(TaskState::Action);
            }
            TaskState::Action => {
                // The flag may still be set at the end stop, so check the value
                if self.fresh_reply(state) && state.position_value() == POSITION_UNINITIALIZED {
                    // Actuator parameters are back to defaults
                    state.set_ignore_protection(false);
                    self.enter(TaskState::Finish);
                } else if self.wait >= REBOOT_WAIT_TICKS {
                    warn!("reboot: actuator did not come back uninitialized");
                    self.enter(TaskState::Finish);
                }
            }
            TaskState::Teardown | TaskState::End => self.enter(TaskState::Finish),
            TaskState::Finish => {}
        }
        Ok(())
    }

    fn step_enable_recovery<L: LinkTx>(
        &mut self,
        state: &mut ActuatorState,
        encoder: &mut CommandEncoder<L>,
    ) -> Result<(), L::Error> {
        match self.state {
            TaskState::Start => {
                encoder.set_ignore_sensor(true)?;
                self.prior_level = state.protection_level();
                self.prior_ignore = state.ignore_protection();
                let level = state.advance_protection();
                state.set_ignore_protection(true);
                info!("recovery: protection level {}", level);
                self.attempts = 0;
                self.enter(TaskState::Setup);
            }
            TaskState::Setup => {
                if self.wait >= SETTLE_TICKS {
                    encoder.read_parameter(ParameterId::IgnoreSensor)?;
                    self.attempts += 1;
                    self.frames_mark = state.frames_received();
                    self.enter(TaskState::Action);
                }
            }
            TaskState::Action => {
                let confirmed = self.fresh_reply(state)
                    && state
                        .parameter_echo()
                        .is_some_and(|echo| echo.confirms(ParameterId::IgnoreSensor, 1));

                if confirmed {
                    self.enter(TaskState::Teardown);
                } else if self.wait >= VERIFY_WAIT_TICKS {
                    if self.attempts < VERIFY_MAX_ATTEMPTS {
                        self.enter(TaskState::Setup);
                    } else {
                        warn!("recovery: ignore-sensor not confirmed, rolling back");
                        if !self.prior_ignore {
                            encoder.set_ignore_sensor(false)?;
                        }
                        state.set_ignore_protection(self.prior_ignore);
                        state.set_protection_level(self.prior_level);
                        state.set_error(ErrorKind::InvalidParameter);
                        self.enter(TaskState::Finish);
                    }
                }
            }
            TaskState::Teardown => {
                encoder.set_hardware_current_limiter(false)?;
                encoder.set_current_limit(
                    state.params().current_limits.for_mode(CurrentMode::Recovery),
                )?;
                self.enter(TaskState::End);
            }
            TaskState::End => {
                if self.wait >= SETTLE_TICKS {
                    self.enter(TaskState::Finish);
                }
            }
            TaskState::Finish => {}
        }
        Ok(())
    }
}

/// Current limiting for a positioning move, by protection level
///
/// Level 0 uses the actuator's hardware limiter. Higher levels switch to
/// the software limit, at the operation then the recovery value.
fn apply_current_profile<L: LinkTx>(
    state: &ActuatorState,
    encoder: &mut CommandEncoder<L>,
) -> Result<(), L::Error> {
    let limits = state.params().current_limits;
    match state.protection_level() {
        0 => encoder.set_hardware_current_limiter(true),
        1 => {
            encoder.set_hardware_current_limiter(false)?;
            encoder.set_current_limit(limits.for_mode(CurrentMode::Operation))
        }
        _ => {
            encoder.set_hardware_current_limiter(false)?;
            encoder.set_current_limit(limits.for_mode(CurrentMode::Recovery))
        }
    }
}
