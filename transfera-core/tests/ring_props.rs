//! RingBuffer against a VecDeque model

use std::collections::VecDeque;

use proptest::prelude::*;
use transfera_core::ring::{RingBuffer, RingError};

const CAPACITY: usize = 7;
const ELEM: usize = 2;

#[derive(Debug, Clone)]
enum Op {
    Push(Vec<u8>),
    Poll(usize),
    Peek,
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..=CAPACITY + 1)
            .prop_flat_map(|n| proptest::collection::vec(any::<u8>(), n * ELEM))
            .prop_map(Op::Push),
        4 => (0..=CAPACITY + 1).prop_map(Op::Poll),
        1 => Just(Op::Peek),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #[test]
    fn test_matches_model(ops in proptest::collection::vec(op(), 1..64)) {
        let mut ring = RingBuffer::<64>::with_layout(CAPACITY, ELEM).unwrap();
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Push(items) => {
                    let result = ring.push(&items);
                    if model.len() + items.len() > CAPACITY * ELEM {
                        prop_assert_eq!(result, Err(RingError::Overflow));
                    } else {
                        prop_assert_eq!(result, Ok(()));
                        model.extend(items);
                    }
                }
                Op::Poll(count) => {
                    let mut out = vec![0u8; count * ELEM];
                    let result = ring.poll(&mut out);
                    if model.is_empty() {
                        prop_assert_eq!(result, Err(RingError::Empty));
                    } else if out.len() > model.len() {
                        prop_assert_eq!(result, Err(RingError::Underrun));
                    } else {
                        prop_assert_eq!(result, Ok(()));
                        let expected: Vec<u8> = model.drain(..out.len()).collect();
                        prop_assert_eq!(out, expected);
                    }
                }
                Op::Peek => {
                    let mut out = [0u8; ELEM];
                    match ring.peek(&mut out) {
                        Ok(()) => {
                            prop_assert_eq!(out[0], model[0]);
                            prop_assert_eq!(out[1], model[1]);
                        }
                        Err(err) => {
                            prop_assert_eq!(err, RingError::Empty);
                            prop_assert!(model.is_empty());
                        }
                    }
                }
                Op::Reset => {
                    ring.reset().unwrap();
                    model.clear();
                }
            }

            let len = model.len() / ELEM;
            prop_assert_eq!(ring.len(), Some(len));
            prop_assert_eq!(ring.free(), Some(CAPACITY - len));
            prop_assert_eq!(ring.is_empty(), len == 0);
            prop_assert_eq!(ring.is_full(), len == CAPACITY);
        }
    }

    #[test]
    fn test_odd_slices_rejected(bytes in proptest::collection::vec(any::<u8>(), 1..13)) {
        prop_assume!(bytes.len() % ELEM != 0);
        let mut ring = RingBuffer::<64>::with_layout(CAPACITY, ELEM).unwrap();
        prop_assert_eq!(ring.push(&bytes), Err(RingError::InvalidParameter));
        prop_assert_eq!(ring.len(), Some(0));
    }
}
