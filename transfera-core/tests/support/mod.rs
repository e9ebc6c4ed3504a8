//! Simulated hook actuator for scenario tests
//!
//! The actuator integrates motion once per tick and answers every tick with
//! a checksummed reply, the way the real motor controller streams
//! telemetry. The bench wires it to a controller through a recording link
//! and the writing half of the receive buffer.

#![allow(dead_code)]

use transfera_core::config::ControlParameters;
use transfera_core::ring::RingError;
use transfera_core::{append_bytes, rx_buffer, HookController, RxBuffer, RxProducer};
use transfera_hal::LinkTx;
use transfera_protocol::{
    CommandEcho, DataSource, MotorCommand, ParameterId, Reply, POSITION_END_STROKE_FLAG,
    POSITION_UNINITIALIZED,
};

/// Link that keeps every command the controller sent
#[derive(Debug, Default)]
pub struct RecordingLink {
    pub sent: Vec<MotorCommand>,
}

impl LinkTx for RecordingLink {
    type Error = ();

    fn send_raw(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        let command = MotorCommand::decode(frame).map_err(|_| ())?;
        self.sent.push(command);
        Ok(())
    }
}

/// Motor controller model
#[derive(Debug)]
pub struct SimActuator {
    /// Physical position; 0 is the closing end stop
    pub physical: i32,
    /// Physical position reported as 0 once homed
    pub offset: i32,
    pub initialized: bool,
    /// Move target in reported coordinates, `None` when stopped
    pub target: Option<i32>,
    /// Signed speed of the running move
    pub speed: i16,
    /// Something blocking travel at this physical position
    pub obstruction: Option<i32>,
    pub error: u8,
    pub seq: u8,
    pub echo_id: u8,
    pub params: [i16; 16],
    pub ready_timer: Option<u32>,
}

impl SimActuator {
    /// Homed actuator standing at `position`
    pub fn homed_at(position: i32) -> Self {
        Self {
            physical: position,
            offset: 0,
            initialized: true,
            target: None,
            speed: 0,
            obstruction: None,
            error: 0,
            seq: 0,
            echo_id: 0,
            params: [0; 16],
            ready_timer: None,
        }
    }

    /// Freshly powered actuator at `physical`
    pub fn unhomed_at(physical: i32) -> Self {
        Self {
            initialized: false,
            ..Self::homed_at(physical)
        }
    }

    fn ignore_sensor(&self) -> bool {
        self.params[ParameterId::IgnoreSensor as usize] != 0
    }

    fn at_end_stop(&self) -> bool {
        self.physical <= 0 || self.obstruction == Some(self.physical)
    }

    pub fn reported_position(&self) -> u16 {
        let value = if self.initialized {
            (self.physical - self.offset).clamp(0, 0x7FFE) as u16
        } else {
            POSITION_UNINITIALIZED
        };

        if self.at_end_stop() && !self.ignore_sensor() {
            value | POSITION_END_STROKE_FLAG
        } else {
            value
        }
    }

    pub fn apply(&mut self, command: MotorCommand) {
        match command {
            MotorCommand::Move {
                target, speed, seq, ..
            } => {
                self.seq = seq;
                self.speed = speed;
                self.target = Some(if self.initialized {
                    target as i32
                } else if speed > 0 {
                    // Unhomed: run towards the end stop
                    i32::MIN
                } else {
                    i32::MAX
                });
            }
            MotorCommand::Stop => self.target = None,
            MotorCommand::Eack => self.error = 0,
            MotorCommand::Reboot => {
                self.target = None;
                self.initialized = false;
                self.params = [0; 16];
            }
            MotorCommand::SetPosition { position } => {
                if position as u16 == POSITION_UNINITIALIZED {
                    self.initialized = false;
                } else {
                    self.offset = self.physical - position as i32;
                    self.initialized = true;
                }
            }
            MotorCommand::SetParameter { id, value } => {
                self.params[id as usize] = value;
                self.echo_id = id as u8;
            }
            MotorCommand::ReadParameter { id } => self.echo_id = id as u8,
            MotorCommand::ReadyForLoading => self.ready_timer = Some(1500),
        }
    }

    /// Integrate one tick of motion
    pub fn advance(&mut self) {
        let Some(target) = self.target else {
            return;
        };

        let step = (self.speed.unsigned_abs() / 4).max(1) as i32;
        // Positive speed closes, towards lower positions
        let direction = if self.speed > 0 { -1 } else { 1 };
        let goal = if self.initialized {
            target + self.offset
        } else {
            target
        };

        let mut next = self.physical + direction * step;
        if (direction < 0 && next <= goal) || (direction > 0 && next >= goal) {
            next = goal;
            self.target = None;
        }

        if let Some(obstruction) = self.obstruction {
            let blocked = (self.physical > obstruction && next <= obstruction)
                || (self.physical < obstruction && next >= obstruction);
            if blocked {
                next = obstruction;
                self.target = None;
            }
        }
        if next <= 0 {
            next = 0;
            self.target = None;
        }

        self.physical = next;
    }

    pub fn reply(&mut self) -> Reply {
        let (source, data) = match self.ready_timer.take() {
            Some(timer) => (DataSource::ReadyTimer, timer.to_le_bytes()),
            None => (
                DataSource::Parameter,
                (self.params[self.echo_id as usize] as i32).to_le_bytes(),
            ),
        };

        Reply {
            frame_type: 1,
            voltage_mv: 24000,
            current_ma: if self.target.is_some() { 900 } else { 40 },
            position: self.reported_position(),
            error: self.error,
            echo: CommandEcho {
                seq: self.seq,
                source,
                data_id: self.echo_id,
            },
            data,
        }
    }
}

/// Controller and actuator running in lockstep
pub struct Bench {
    pub controller: HookController<'static, RecordingLink>,
    pub actuator: SimActuator,
    rx: RxProducer<'static>,
    delivered: usize,
}

impl Bench {
    pub fn new(actuator: SimActuator) -> Self {
        // One buffer per bench, alive for the rest of the test binary
        let ring: &'static mut RxBuffer = Box::leak(Box::new(rx_buffer().unwrap()));
        let (rx, consumer) = ring.split().unwrap();
        Self {
            controller: HookController::new(
                RecordingLink::default(),
                consumer,
                ControlParameters::default(),
            ),
            actuator,
            rx,
            delivered: 0,
        }
    }

    /// Feed bytes the way the link receive path does
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), RingError> {
        append_bytes(&mut self.rx, bytes)
    }

    /// One tick: deliver sent commands, move, reply, run the controller
    pub fn step(&mut self) {
        let pending: Vec<MotorCommand> = self.controller.link().sent[self.delivered..].to_vec();
        self.delivered += pending.len();
        for command in pending {
            self.actuator.apply(command);
        }

        self.actuator.advance();
        let frame = self.actuator.reply().to_bytes();
        self.append(&frame).unwrap();
        self.controller.tick();
    }

    pub fn run(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Step until the sequencer is idle and the queue drained
    pub fn run_until_idle(&mut self, max_ticks: u32) {
        for _ in 0..max_ticks {
            self.step();
            if !self.controller.is_command_executing() && self.controller.pending_commands() == 0 {
                return;
            }
        }
        panic!(
            "still busy after {} ticks: {:?} in {:?}",
            max_ticks,
            self.controller.active_operation(),
            self.controller.active_state()
        );
    }

    pub fn sent(&self) -> &[MotorCommand] {
        &self.controller.link().sent
    }

    pub fn moves(&self) -> Vec<MotorCommand> {
        self.sent()
            .iter()
            .copied()
            .filter(|c| matches!(c, MotorCommand::Move { .. }))
            .collect()
    }
}
