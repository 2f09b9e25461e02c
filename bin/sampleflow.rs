use std::fs::OpenOptions;
use std::io::{self, Write};

use failure::Error;
use log::*;
use structopt::StructOpt;

use sampleflow::graph::Graph;
use sampleflow::module::Kind;
use sampleflow::{Config, TransportKind};

#[derive(StructOpt)]
#[structopt(name = "sampleflow", about = "modular sample pipeline")]
struct Cli {
    /// file to write samples to, `-` for stdout [default: /dev/audio]
    #[structopt(short, long)]
    output: Option<String>,

    /// output sample rate in hertz
    #[structopt(long, default_value = "44100")]
    rate: u32,

    /// samples per transport buffer
    #[structopt(long, default_value = "1024")]
    batch: usize,

    /// bytes per device write
    #[structopt(long, default_value = "1024")]
    obuf: usize,

    #[structopt(long)]
    mono: bool,

    /// hand samples over one at a time instead of in batches
    #[structopt(long)]
    unbuffered: bool,

    #[structopt(long, default_value = "440")]
    carrier: f32,

    #[structopt(long, default_value = "20")]
    mod_freq: f32,

    #[structopt(long, default_value = "1000")]
    mod_depth: f32,
}

fn open_output(path: Option<&str>) -> io::Result<Box<dyn Write + Send>> {
    Ok(match path {
        Some("-") => Box::new(io::stdout()),
        Some(path) => Box::new(
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?,
        ),
        None => Box::new(OpenOptions::new().write(true).open("/dev/audio")?),
    })
}

fn main() -> Result<(), Error> {
    pretty_env_logger::init();
    let args = Cli::from_args();

    let cfg = Config {
        rate: args.rate,
        irate: args.rate,
        batch: args.batch,
        obuf: args.obuf,
        channels: if args.mono { 1 } else { 2 },
        transport: if args.unbuffered {
            TransportKind::Unbuffered
        } else {
            TransportKind::Buffered
        },
        ..Config::default()
    };
    debug!("{:?}", cfg);

    let out = open_output(args.output.as_deref())?;
    let mut g = Graph::new(cfg);

    // sawtooth modulator scaled by the depth, on top of the carrier
    let mod_freq = g.add(Kind::Const(args.mod_freq));
    let mod_depth = g.add(Kind::Const(args.mod_depth));
    let modulator = g.add(Kind::Ramp);
    let scaled = g.add(Kind::Mul);
    g.connect(mod_freq, "out", modulator, "freq")?;
    g.connect(modulator, "out", scaled, "in1")?;
    g.connect(mod_depth, "out", scaled, "in2")?;

    let carrier = g.add(Kind::Const(args.carrier));
    let freq = g.add(Kind::Add);
    g.connect(scaled, "out", freq, "in1")?;
    g.connect(carrier, "out", freq, "in2")?;

    let phase = g.add(Kind::Ramp);
    let shaper = g.add(Kind::SinShp);
    let sink = g.add(Kind::Out(out));
    g.connect(freq, "out", phase, "freq")?;
    g.connect(phase, "out", shaper, "in")?;
    g.connect(shaper, "out", sink, "in")?;

    g.spawn()?.wait()
}
