use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, select, tick};
use crossbeam_utils::thread;
use failure::{bail, format_err, Error};
use log::*;
use structopt::StructOpt;

use sampleflow::{pipe, Sample, TransportKind};

#[derive(StructOpt)]
#[structopt(name = "pipe-stress", about = "one producer, many consumers, as fast as possible")]
struct Cli {
    #[structopt(short, long, default_value = "1024")]
    capacity: usize,

    #[structopt(short = "n", long, default_value = "10")]
    consumers: usize,

    #[structopt(short, long, default_value = "20000000")]
    samples: usize,

    #[structopt(long)]
    unbuffered: bool,
}

// keeps every value exactly representable
fn value(i: usize) -> Sample {
    (i % 65536) as Sample
}

fn main() -> Result<(), Error> {
    pretty_env_logger::init();
    let args = Cli::from_args();
    let kind = if args.unbuffered {
        TransportKind::Unbuffered
    } else {
        TransportKind::Buffered
    };

    let pipe = pipe::open(kind, args.capacity)?;
    let mut tx = pipe.sender()?;
    let rxs = (0..args.consumers)
        .map(|_| pipe.recver())
        .collect::<Result<Vec<_>, _>>()?;

    let samples = args.samples;
    let sent = AtomicUsize::new(0);
    let start = Instant::now();

    thread::scope(|s| -> Result<(), Error> {
        let sent = &sent;
        let (done_tx, done) = bounded::<()>(0);

        let producer = s.spawn(move |_| -> Result<(), Error> {
            let _done = done_tx;
            for i in 0..samples {
                tx.send(value(i))?;
                if i % 4096 == 0 {
                    sent.store(i, Ordering::Relaxed);
                }
            }
            sent.store(samples, Ordering::Relaxed);
            Ok(())
        });

        let consumers: Vec<_> = rxs
            .into_iter()
            .enumerate()
            .map(|(c, mut rx)| {
                s.spawn(move |_| -> Result<(), Error> {
                    for i in 0..samples {
                        let v = rx.recv()?;
                        if v != value(i) {
                            bail!("consumer {} read {} at {}, expected {}", c, v, i, value(i));
                        }
                    }
                    Ok(())
                })
            })
            .collect();

        let ticker = tick(Duration::from_secs(5));
        loop {
            select! {
                recv(done) -> _ => break,
                recv(ticker) -> _ => info!("{} samples sent", sent.load(Ordering::Relaxed)),
            }
        }

        producer
            .join()
            .map_err(|_| format_err!("producer panicked"))??;
        for h in consumers {
            h.join().map_err(|_| format_err!("consumer panicked"))??;
        }
        Ok(())
    })
    .map_err(|_| format_err!("stress thread panicked"))??;

    let elapsed = start.elapsed();
    println!(
        "{} samples to {} consumers in {:?} ({:.0} samples/s)",
        samples,
        args.consumers,
        elapsed,
        samples as f64 / elapsed.as_secs_f64()
    );
    Ok(())
}
