use std::time::Duration;

use crossbeam::thread;
use crossbeam_channel::{bounded, RecvTimeoutError};

use sampleflow::{BufPipe, Endpoint, PipeError, Sample, Transport, UnbufPipe};

/// Drive one producer and `consumers` consumers on their own threads and
/// return what every consumer read. The producer pads the stream to a whole
/// number of batches so the tail is published.
fn broadcast(
    pipe: &dyn Transport,
    batch: usize,
    consumers: usize,
    producer_first: bool,
    input: &[Sample],
) -> Vec<Vec<Sample>> {
    let mut tx = None;
    if producer_first {
        tx = Some(pipe.sender().unwrap());
    }
    let rxs: Vec<Box<dyn Endpoint>> = (0..consumers).map(|_| pipe.recver().unwrap()).collect();
    let mut tx = match tx {
        Some(tx) => tx,
        None => pipe.sender().unwrap(),
    };

    let pad = (batch - input.len() % batch) % batch;
    let n = input.len();

    thread::scope(|s| {
        s.spawn(move |_| {
            for v in input {
                tx.send(*v).unwrap();
            }
            for _ in 0..pad {
                tx.send(0.0).unwrap();
            }
        });

        let handles: Vec<_> = rxs
            .into_iter()
            .map(|mut rx| s.spawn(move |_| (0..n).map(|_| rx.recv().unwrap()).collect::<Vec<_>>()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
    .unwrap()
}

fn ramp(n: usize) -> Vec<Sample> {
    (0..n).map(|i| i as Sample).collect()
}

#[test]
fn single_consumer_gets_every_batch() {
    let pipe = BufPipe::new(4).unwrap();
    let input = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];

    let got = broadcast(&pipe, 4, 1, true, &input);
    assert_eq!(got, vec![input.to_vec()]);
}

#[test]
fn every_consumer_reads_the_whole_stream() {
    let pipe = BufPipe::new(2).unwrap();
    let input = [0.1, 0.2, 0.3, 0.4];

    let got = broadcast(&pipe, 2, 3, true, &input);
    assert_eq!(got.len(), 3);
    for seq in got {
        assert_eq!(seq, input.to_vec());
    }
}

#[test]
fn order_preserved_across_capacities() {
    let input = ramp(5000);
    for &cap in &[1, 2, 3, 7, 64, 1024] {
        let pipe = BufPipe::new(cap).unwrap();
        for seq in broadcast(&pipe, cap, 3, true, &input) {
            assert_eq!(seq, input, "capacity {}", cap);
        }
    }

    let pipe = UnbufPipe::new();
    for seq in broadcast(&pipe, 1, 3, true, &input) {
        assert_eq!(seq, input);
    }
}

#[test]
fn creation_order_does_not_matter() {
    let input = ramp(300);
    for &producer_first in &[true, false] {
        let buffered = BufPipe::new(16).unwrap();
        let unbuffered = UnbufPipe::new();

        let a = broadcast(&buffered, 16, 2, producer_first, &input);
        let b = broadcast(&unbuffered, 1, 2, producer_first, &input);
        assert_eq!(a, vec![input.clone(), input.clone()]);
        assert_eq!(a, b);
    }
}

#[test]
fn slow_consumers_never_see_overwritten_data() {
    let cap = 5;
    let n = 20_000;
    let pipe = BufPipe::new(cap).unwrap();
    let mut tx = pipe.sender().unwrap();
    let rxs: Vec<_> = (0..4).map(|_| pipe.recver().unwrap()).collect();

    thread::scope(|s| {
        s.spawn(move |_| {
            for i in 0..n {
                tx.send(i as Sample).unwrap();
            }
        });
        for (c, mut rx) in rxs.into_iter().enumerate() {
            s.spawn(move |_| {
                for i in 0..n {
                    // uneven pacing between consumers
                    if i % (c + 2) == 0 {
                        std::thread::yield_now();
                    }
                    assert_eq!(rx.recv().unwrap(), i as Sample, "consumer {}", c);
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn buffered_producer_runs_at_most_two_batches_ahead() {
    let pipe = BufPipe::new(2).unwrap();
    let mut tx = pipe.sender().unwrap();
    let mut rx = pipe.recver().unwrap();
    let (sent_tx, sent) = bounded(8);

    thread::scope(|s| {
        s.spawn(move |_| {
            for i in 0..6 {
                tx.send(i as Sample).unwrap();
                sent_tx.send(i).unwrap();
            }
        });

        for i in 0..4 {
            assert_eq!(sent.recv_timeout(Duration::from_secs(5)), Ok(i));
        }
        assert_eq!(
            sent.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        );

        assert_eq!(rx.recv(), Ok(0.0));
        assert_eq!(rx.recv(), Ok(1.0));
        assert_eq!(sent.recv_timeout(Duration::from_secs(5)), Ok(4));
        assert_eq!(sent.recv_timeout(Duration::from_secs(5)), Ok(5));
        for i in 2..6 {
            assert_eq!(rx.recv(), Ok(i as Sample));
        }
    })
    .unwrap();
}

#[test]
fn unbuffered_send_waits_for_every_consumer() {
    let pipe = UnbufPipe::new();
    let mut tx = pipe.sender().unwrap();
    let mut r1 = pipe.recver().unwrap();
    let mut r2 = pipe.recver().unwrap();
    let (sent_tx, sent) = bounded(2);

    thread::scope(|s| {
        s.spawn(move |_| {
            for v in &[5.0, 6.0] {
                tx.send(*v).unwrap();
                sent_tx.send(*v).unwrap();
            }
        });

        assert_eq!(sent.recv_timeout(Duration::from_secs(5)), Ok(5.0));
        assert_eq!(
            sent.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        );

        assert_eq!(r1.recv(), Ok(5.0));
        assert_eq!(
            sent.recv_timeout(Duration::from_millis(100)),
            Err(RecvTimeoutError::Timeout)
        );

        assert_eq!(r2.recv(), Ok(5.0));
        assert_eq!(sent.recv_timeout(Duration::from_secs(5)), Ok(6.0));
        assert_eq!(r1.recv(), Ok(6.0));
        assert_eq!(r2.recv(), Ok(6.0));
    })
    .unwrap();
}

#[test]
fn misuse_is_reported_at_the_call() {
    let pipe = BufPipe::new(8).unwrap();
    let mut tx = Transport::sender(&pipe).unwrap();
    let mut rx = Transport::recver(&pipe).unwrap();

    assert!(matches!(tx.recv(), Err(PipeError::InvalidRole { .. })));
    assert!(matches!(rx.send(0.0), Err(PipeError::InvalidRole { .. })));
    assert!(matches!(Transport::sender(&pipe), Err(PipeError::ProducerTaken)));
    assert_eq!(BufPipe::new(0).err(), Some(PipeError::ZeroCapacity));
}

/// One producer, `consumers` checking consumers, `samples` samples.
fn hammer(pipe: &dyn Transport, consumers: usize, samples: usize) {
    let mut tx = pipe.sender().unwrap();
    let rxs: Vec<_> = (0..consumers).map(|_| pipe.recver().unwrap()).collect();

    thread::scope(|s| {
        s.spawn(move |_| {
            for i in 0..samples {
                tx.send(i as Sample).unwrap();
            }
        });
        for mut rx in rxs {
            s.spawn(move |_| {
                for i in 0..samples {
                    let v = rx.recv().unwrap();
                    if v != i as Sample {
                        panic!("expected {} got {}", i, v);
                    }
                }
            });
        }
    })
    .unwrap();
}

#[test]
fn ten_consumers_lockstep_batches() {
    hammer(&BufPipe::new(1).unwrap(), 10, 20_000);
    hammer(&BufPipe::new(3).unwrap(), 10, 30_000);
    hammer(&BufPipe::new(1024).unwrap(), 10, 1024 * 200);
    hammer(&UnbufPipe::new(), 10, 20_000);
}

#[test]
#[ignore]
fn ten_consumers_two_million_samples() {
    hammer(&BufPipe::new(1).unwrap(), 10, 2_000_000);
}
