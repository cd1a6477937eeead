use std::collections::VecDeque;

use ph_bytering::{ByteRing, PushError};
use proptest::prelude::*;

const N: usize = 16;

#[derive(Debug, Clone)]
enum Op {
    Push(u8),
    Pop,
    Bulk(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u8>().prop_map(Op::Push),
        2 => Just(Op::Pop),
        1 => (0..N).prop_map(Op::Bulk),
    ]
}

proptest! {
    /// Random interleavings keep FIFO order, the occupancy bounds and the drop count.
    #[test]
    fn matches_queue_model(ops in proptest::collection::vec(op_strategy(), 0..600)) {
        let ring = ByteRing::<N>::new();
        let mut producer = ring.producer();
        let mut consumer = ring.consumer();
        let mut model = VecDeque::new();
        let mut drops = 0u32;

        for op in &ops {
            match *op {
                Op::Push(b) => match producer.push(b) {
                    Ok(headroom) => {
                        model.push_back(b);
                        prop_assert_eq!(headroom, N - 1 - model.len());
                    }
                    Err(PushError::Full) => {
                        prop_assert_eq!(model.len(), N - 1);
                        drops += 1;
                    }
                },
                Op::Pop => {
                    prop_assert_eq!(consumer.pop(), model.pop_front());
                }
                Op::Bulk(want) => {
                    let run = consumer.bulk_slice().unwrap_or(&[]);
                    prop_assert_eq!(run.len(), consumer.bulk_len());
                    let take = want.min(run.len());
                    for (i, b) in run[..take].iter().enumerate() {
                        prop_assert_eq!(Some(b), model.get(i));
                    }
                    consumer.bulk_remove(take);
                    model.drain(..take);
                }
            }

            prop_assert!(ring.used() <= N - 1);
            prop_assert_eq!(ring.used() + ring.free(), N);
            prop_assert_eq!(ring.used(), model.len());
            prop_assert_eq!(ring.dropped(), drops);
        }
    }

    /// Draining through bulk runs yields the same bytes as draining with `pop`.
    #[test]
    fn bulk_drain_matches_pop_drain(
        warmup in 0..N,
        data in proptest::collection::vec(any::<u8>(), 0..N),
    ) {
        let by_pop = ByteRing::<N>::new();
        let by_bulk = ByteRing::<N>::new();

        let mut popped = Vec::new();
        let mut bulked = Vec::new();

        for (ring, out, bulk) in [(&by_pop, &mut popped, false), (&by_bulk, &mut bulked, true)] {
            let mut producer = ring.producer();
            let mut consumer = ring.consumer();

            // Shift the read offset so the data straddles the end of storage.
            for _ in 0..warmup {
                producer.push(0).unwrap();
                consumer.pop().unwrap();
            }
            for &b in &data {
                if producer.push(b).is_err() {
                    break;
                }
            }

            if bulk {
                let mut runs = 0;
                while consumer.bulk_len() > 0 {
                    let run = consumer.bulk_slice().unwrap();
                    prop_assert!(warmup % N + run.len() <= N || runs > 0);
                    out.extend_from_slice(run);
                    let n = run.len();
                    consumer.bulk_remove(n);
                    runs += 1;
                }
                prop_assert!(runs <= 2);
            } else {
                while let Some(b) = consumer.pop() {
                    out.push(b);
                }
            }
        }

        let kept = data.len().min(N - 1);
        prop_assert_eq!(&popped[..], &data[..kept]);
        prop_assert_eq!(popped, bulked);
    }
}

#[test]
fn ring_of_sixteen_takes_fifteen() {
    let ring = ByteRing::<16>::new();
    let mut producer = ring.producer();
    let mut consumer = ring.consumer();

    for b in 0..15u8 {
        assert!(producer.push(b).is_ok());
    }
    assert_eq!(producer.push(15), Err(PushError::Full));
    assert_eq!(ring.dropped(), 1);

    for b in 0..15u8 {
        assert_eq!(consumer.pop(), Some(b));
    }
    assert_eq!(consumer.pop(), None);
}
