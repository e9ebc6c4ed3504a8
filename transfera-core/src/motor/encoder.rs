//! Command encoder

use transfera_hal::LinkTx;
use transfera_protocol::{
    MotorCommand, MoveMode, ParameterId, POSITION_UNINITIALIZED, POSITION_VALUE_MASK,
};

/// Builds motor command frames and sends each one whole
pub struct CommandEncoder<L: LinkTx> {
    link: L,
    sent: u32,
}

impl<L: LinkTx> CommandEncoder<L> {
    pub fn new(link: L) -> Self {
        Self { link, sent: 0 }
    }

    /// Encode and send one command
    pub fn send(&mut self, command: MotorCommand) -> Result<(), L::Error> {
        let frame = command.to_bytes();
        self.link.send_raw(&frame)?;
        self.sent = self.sent.wrapping_add(1);
        trace!("sent {:?}", command);
        Ok(())
    }

    /// Constant-speed move to `target`
    pub fn move_to(&mut self, target: u16, speed: i16, seq: u8) -> Result<(), L::Error> {
        self.send(MotorCommand::Move {
            target: to_wire_position(target),
            speed,
            mode: MoveMode::ConstantSpeed,
            seq,
        })
    }

    pub fn stop(&mut self) -> Result<(), L::Error> {
        self.send(MotorCommand::Stop)
    }

    /// Acknowledge the actuator's error
    pub fn eack(&mut self) -> Result<(), L::Error> {
        self.send(MotorCommand::Eack)
    }

    pub fn reboot(&mut self) -> Result<(), L::Error> {
        self.send(MotorCommand::Reboot)
    }

    /// Declare the current position as home
    pub fn set_position_home(&mut self) -> Result<(), L::Error> {
        self.send(MotorCommand::SetPosition { position: 0 })
    }

    /// Forget the position; the actuator reports the sentinel until homed
    pub fn set_position_uninitialized(&mut self) -> Result<(), L::Error> {
        self.send(MotorCommand::SetPosition {
            position: to_wire_position(POSITION_UNINITIALIZED),
        })
    }

    /// Make the actuator ignore (or honour) its end-of-stroke sensor
    pub fn set_ignore_sensor(&mut self, ignore: bool) -> Result<(), L::Error> {
        self.set_parameter(ParameterId::IgnoreSensor, ignore as i16)
    }

    /// Software current limit (mA)
    pub fn set_current_limit(&mut self, limit_ma: i16) -> Result<(), L::Error> {
        self.set_parameter(ParameterId::CurrentLimitValue, limit_ma)
    }

    /// Select the hardware limiter (`true`) or the software limit
    pub fn set_hardware_current_limiter(&mut self, enabled: bool) -> Result<(), L::Error> {
        self.set_parameter(ParameterId::CurrentLimitType, enabled as i16)
    }

    pub fn set_parameter(&mut self, id: ParameterId, value: i16) -> Result<(), L::Error> {
        self.send(MotorCommand::SetParameter { id, value })
    }

    /// Ask the actuator to echo a parameter in its replies
    pub fn read_parameter(&mut self, id: ParameterId) -> Result<(), L::Error> {
        self.send(MotorCommand::ReadParameter { id })
    }

    /// Ask the actuator to start the ready-for-lifting countdown
    pub fn ready_for_loading(&mut self) -> Result<(), L::Error> {
        self.send(MotorCommand::ReadyForLoading)
    }

    /// Frames sent successfully since creation
    pub fn sent(&self) -> u32 {
        self.sent
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }
}

/// Positions are 15-bit on the wire
fn to_wire_position(position: u16) -> i16 {
    (position & POSITION_VALUE_MASK) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;
    use transfera_protocol::COMMAND_FRAME_LEN;

    #[derive(Default)]
    struct RecordingLink {
        frames: Vec<[u8; COMMAND_FRAME_LEN], 16>,
        fail: bool,
    }

    impl LinkTx for RecordingLink {
        type Error = ();

        fn send_raw(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            if self.fail {
                return Err(());
            }
            let mut bytes = [0u8; COMMAND_FRAME_LEN];
            bytes.copy_from_slice(frame);
            self.frames.push(bytes).map_err(|_| ())
        }
    }

    fn last(encoder: &CommandEncoder<RecordingLink>) -> MotorCommand {
        let frame = encoder.link().frames.last().unwrap();
        MotorCommand::decode(frame).unwrap()
    }

    #[test]
    fn test_move_to() {
        let mut encoder = CommandEncoder::new(RecordingLink::default());
        encoder.move_to(13393, -1200, 4).unwrap();

        let frame = encoder.link().frames[0];
        assert_eq!(frame[0], 0xFE);
        assert_eq!(frame[1], 5);
        assert_eq!(
            last(&encoder),
            MotorCommand::Move {
                target: 13393,
                speed: -1200,
                mode: MoveMode::ConstantSpeed,
                seq: 4,
            }
        );
    }

    #[test]
    fn test_parameter_helpers() {
        let mut encoder = CommandEncoder::new(RecordingLink::default());

        encoder.set_ignore_sensor(true).unwrap();
        assert_eq!(
            last(&encoder),
            MotorCommand::SetParameter {
                id: ParameterId::IgnoreSensor,
                value: 1
            }
        );

        encoder.set_hardware_current_limiter(false).unwrap();
        assert_eq!(
            last(&encoder),
            MotorCommand::SetParameter {
                id: ParameterId::CurrentLimitType,
                value: 0
            }
        );

        encoder.set_current_limit(3500).unwrap();
        assert_eq!(
            last(&encoder),
            MotorCommand::SetParameter {
                id: ParameterId::CurrentLimitValue,
                value: 3500
            }
        );

        encoder.read_parameter(ParameterId::IgnoreSensor).unwrap();
        assert_eq!(
            last(&encoder),
            MotorCommand::ReadParameter {
                id: ParameterId::IgnoreSensor
            }
        );
        assert_eq!(encoder.sent(), 4);
    }

    #[test]
    fn test_set_position() {
        let mut encoder = CommandEncoder::new(RecordingLink::default());
        encoder.set_position_home().unwrap();
        assert_eq!(last(&encoder), MotorCommand::SetPosition { position: 0 });
        encoder.set_position_uninitialized().unwrap();
        assert_eq!(last(&encoder), MotorCommand::SetPosition { position: 0x7FFF });
    }

    #[test]
    fn test_send_failure_propagates() {
        let mut encoder = CommandEncoder::new(RecordingLink {
            fail: true,
            ..Default::default()
        });
        assert_eq!(encoder.stop(), Err(()));
        assert_eq!(encoder.sent(), 0);
    }
}
