//! Outbound link abstraction
//!
//! The core hands every command frame to a [`LinkTx`] whole. Framing over the
//! radio (MTU splitting, queuing) belongs to the implementation.

/// Raw byte sink towards the actuator
pub trait LinkTx {
    /// Error type for transmit operations
    type Error;

    /// Queue a complete frame for transmission
    ///
    /// Must not block the tick; implementations buffer and return.
    fn send_raw(&mut self, frame: &[u8]) -> Result<(), Self::Error>;
}

impl<T: LinkTx + ?Sized> LinkTx for &mut T {
    type Error = T::Error;

    fn send_raw(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
        (**self).send_raw(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLink {
        frames: usize,
        bytes: usize,
    }

    impl LinkTx for CountingLink {
        type Error = ();

        fn send_raw(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            self.frames += 1;
            self.bytes += frame.len();
            Ok(())
        }
    }

    fn send_stop<L: LinkTx>(mut link: L) -> Result<(), L::Error> {
        link.send_raw(&[0xFE, 10, 0, 0, 0, 0, 0, 0])
    }

    #[test]
    fn test_send_through_mut_ref() {
        let mut link = CountingLink { frames: 0, bytes: 0 };
        send_stop(&mut link).unwrap();
        send_stop(&mut link).unwrap();
        assert_eq!(link.frames, 2);
        assert_eq!(link.bytes, 16);
    }
}
