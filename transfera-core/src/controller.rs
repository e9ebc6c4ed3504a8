//! Controller facade
//!
//! Owns the reading half of the receive buffer, the actuator state, the
//! encoder and the sequencer. The firmware drives it from two places:
//!
//! - the link receive path holds the [`RxProducer`] and calls
//!   [`append_bytes`]
//! - a fixed-period task calls [`HookController::tick`]
//!
//! The two halves need no lock between them, so the receive path may run in
//! an interrupt while the tick runs in thread mode.

use transfera_hal::LinkTx;
use transfera_protocol::{RemoteCommand, RemoteError};

use crate::commands::{CommandInput, CommandSequencer, Operation, TaskState};
use crate::config::timing::RX_BUFFER_LEN;
use crate::config::ControlParameters;
use crate::motor::CommandEncoder;
use crate::ring::{Consumer, Producer, RingBuffer, RingError};
use crate::state::{ActuatorState, DecodeStats, ErrorKind, HookState, ProtocolDecoder};

/// Receive buffer sized for the controller
pub type RxBuffer = RingBuffer<RX_BUFFER_LEN>;
/// Writing half, owned by the link receive path
pub type RxProducer<'a> = Producer<'a, RX_BUFFER_LEN>;
/// Reading half, owned by the controller
pub type RxConsumer<'a> = Consumer<'a, RX_BUFFER_LEN>;

/// Byte-wide receive buffer using all of its storage
pub fn rx_buffer() -> Result<RxBuffer, RingError> {
    RingBuffer::with_layout(RX_BUFFER_LEN, 1)
}

/// Buffer bytes received from the actuator
///
/// All or nothing: on overflow the whole chunk is dropped and the decoder
/// resynchronizes on the next sync byte.
pub fn append_bytes(rx: &mut RxProducer<'_>, bytes: &[u8]) -> Result<(), RingError> {
    rx.push(bytes).inspect_err(|_| {
        warn!("rx buffer full, dropped {} bytes", bytes.len());
    })
}

/// Snapshot for the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HookStatus {
    pub hook_state: HookState,
    pub voltage_mv: u16,
    pub current_ma: i16,
    /// Latched error code, 0 when none
    pub error_code: u8,
    pub ready_for_lifting: bool,
    pub command_in_progress: bool,
    pub protection_level: u8,
}

/// The control core for one hook
pub struct HookController<'a, L: LinkTx> {
    rx: RxConsumer<'a>,
    decoder: ProtocolDecoder,
    state: ActuatorState,
    encoder: CommandEncoder<L>,
    sequencer: CommandSequencer,
    ticks: u32,
}

impl<'a, L: LinkTx> HookController<'a, L> {
    pub fn new(link: L, rx: RxConsumer<'a>, params: ControlParameters) -> Self {
        Self {
            rx,
            decoder: ProtocolDecoder::new(),
            state: ActuatorState::new(params),
            encoder: CommandEncoder::new(link),
            sequencer: CommandSequencer::new(),
            ticks: 0,
        }
    }

    /// Decode pending replies, then run the sequencer once
    pub fn tick(&mut self) -> DecodeStats {
        let stats = self.decoder.run(&mut self.rx, &mut self.state);
        self.sequencer.run(&mut self.state, &mut self.encoder);
        self.ticks = self.ticks.wrapping_add(1);
        stats
    }

    /// Queue a command; false when the queue is full
    pub fn enqueue_command(&mut self, input: CommandInput) -> bool {
        self.sequencer.enqueue(input)
    }

    /// Queue the request carried by a remote frame
    ///
    /// Returns whether something was queued. A frame selecting no single
    /// target is valid and queues nothing.
    pub fn handle_remote(&mut self, frame: &[u8]) -> Result<bool, RemoteError> {
        let remote = RemoteCommand::parse(frame)?;
        match remote.request() {
            Some(request) => Ok(self.enqueue_command(Operation::from(request).into())),
            None => {
                debug!("remote frame without a single target");
                Ok(false)
            }
        }
    }

    /// Ask the actuator for the ready-for-lifting countdown
    ///
    /// Sent straight away, outside the command queue. The timer comes back
    /// in the replies and is read through [`HookController::status`].
    pub fn request_ready_for_loading(&mut self) -> Result<(), L::Error> {
        self.encoder.ready_for_loading()
    }

    pub fn flush_queue(&mut self) {
        self.sequencer.flush_queue();
    }

    pub fn is_command_executing(&self) -> bool {
        self.sequencer.is_command_executing()
    }

    /// Requests queued behind the running task
    pub fn pending_commands(&self) -> usize {
        self.sequencer.pending()
    }

    /// Abort whatever runs and stop the motor on the next tick
    pub fn force_stop(&mut self) {
        self.sequencer.force_stop();
    }

    pub fn active_operation(&self) -> Option<Operation> {
        self.sequencer.active_operation()
    }

    pub fn active_state(&self) -> Option<TaskState> {
        self.sequencer.active_state()
    }

    pub fn hook_state(&self) -> HookState {
        self.state.hook_state()
    }

    pub fn error(&self) -> ErrorKind {
        self.state.error()
    }

    /// Pull the display snapshot
    ///
    /// Takes `&mut self` because reading ready-for-lifting advances its timer.
    pub fn status(&mut self) -> HookStatus {
        HookStatus {
            hook_state: self.state.hook_state(),
            voltage_mv: self.state.voltage_mv(),
            current_ma: self.state.current_ma(),
            error_code: self.state.error().code(),
            ready_for_lifting: self.state.ready_for_lifting(),
            command_in_progress: self.sequencer.is_command_executing(),
            protection_level: self.state.protection_level(),
        }
    }

    pub fn state(&self) -> &ActuatorState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ActuatorState {
        &mut self.state
    }

    /// Decoder totals since start-up
    pub fn decode_totals(&self) -> DecodeStats {
        self.decoder.totals()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn link(&self) -> &L {
        self.encoder.link()
    }

    pub fn link_mut(&mut self) -> &mut L {
        self.encoder.link_mut()
    }
}
