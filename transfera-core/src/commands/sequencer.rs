//! Command sequencer
//!
//! Bounded FIFO of requests with at most one task running. Per tick:
//!
//! 1. Idle: take the next request (requests that cannot run are dropped)
//! 2. Step the running task
//! 3. Apply the cross-cutting policies: a task running too long, or any
//!    task other than Stop/Eack running while an error is latched, is
//!    replaced by a Stop installed directly, ahead of anything queued

use heapless::Deque;
use transfera_hal::LinkTx;

use super::input::{CommandInput, Operation};
use super::task::{CommandTask, TaskState};
use crate::config::timing::{COMMAND_QUEUE_LEN, COMMAND_TIMEOUT_TICKS};
use crate::motor::CommandEncoder;
use crate::state::{ActuatorState, ErrorKind};

/// Runs queued commands one at a time
#[derive(Debug, Default)]
pub struct CommandSequencer {
    queue: Deque<CommandInput, COMMAND_QUEUE_LEN>,
    active: Option<CommandTask>,
}

impl CommandSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a request
    ///
    /// Returns false (and logs) when the queue is full; the request is lost.
    pub fn enqueue(&mut self, input: CommandInput) -> bool {
        match self.queue.push_back(input) {
            Ok(()) => true,
            Err(rejected) => {
                error!("command queue full, dropped {:?}", rejected.operation);
                false
            }
        }
    }

    /// Drop every queued request; the running task is left alone
    pub fn flush_queue(&mut self) {
        self.queue.clear();
    }

    /// True while a task is running
    pub fn is_command_executing(&self) -> bool {
        self.active.is_some()
    }

    /// Requests waiting behind the running task
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn active_operation(&self) -> Option<Operation> {
        self.active.as_ref().map(CommandTask::operation)
    }

    pub fn active_state(&self) -> Option<TaskState> {
        self.active.as_ref().map(CommandTask::state)
    }

    /// Replace whatever is running with a Stop, ahead of the queue
    pub fn force_stop(&mut self) {
        if let Some(task) = &self.active {
            warn!("aborting {:?} in {:?}", task.operation(), task.state());
        }
        self.active = Some(CommandTask::new(Operation::Stop));
    }

    /// One sequencer tick
    pub fn run<L: LinkTx>(&mut self, state: &mut ActuatorState, encoder: &mut CommandEncoder<L>) {
        if self.active.is_none() {
            self.dequeue(state);
        }

        let Some(task) = self.active.as_mut() else {
            return;
        };

        match task.step(state, encoder) {
            Ok(TaskState::Finish) => {
                info!("{:?} finished after {} ticks", task.operation(), task.timer());
                self.active = None;
                return;
            }
            Ok(_) => {}
            Err(_) => {
                warn!("link send failed during {:?} {:?}", task.operation(), task.state());
            }
        }

        self.apply_policies(state);
    }

    fn dequeue(&mut self, state: &ActuatorState) {
        let Some(input) = self.queue.pop_front() else {
            return;
        };

        let operation = input.operation;
        if operation == Operation::None {
            debug!("dropping empty request");
            return;
        }
        if state.has_error() && !operation.runs_during_fault() {
            warn!("{:?} suppressed, error {:?} latched", operation, state.error());
            return;
        }
        if operation.target().is_some() && !state.is_position_known() {
            warn!("{:?} refused, hook {:?}", operation, state.hook_state());
            return;
        }

        info!("starting {:?}", operation);
        self.active = Some(CommandTask::new(operation));
    }

    fn apply_policies(&mut self, state: &mut ActuatorState) {
        let Some(task) = &self.active else {
            return;
        };
        let operation = task.operation();

        if task.timer() > COMMAND_TIMEOUT_TICKS {
            warn!("{:?} timed out", operation);
            state.set_error(ErrorKind::CommandTimeout);
            if operation == Operation::Stop {
                self.active = None;
            } else {
                self.force_stop();
            }
        } else if state.has_error() && !operation.runs_during_fault() {
            warn!("{:?} aborted by {:?}", operation, state.error());
            self.force_stop();
        }
    }
}
