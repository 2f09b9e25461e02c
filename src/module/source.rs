use failure::Error;

use super::{Module, Port};
use crate::{Config, Sample};

/// Emits the same value forever.
pub struct Const {
    val: Sample,
    out: Port,
}

impl Const {
    pub fn new(val: Sample, out: Port) -> Const {
        Const { val, out }
    }
}

impl Module for Const {
    fn name(&self) -> &'static str {
        "constval"
    }

    fn step(&mut self) -> Result<(), Error> {
        self.out.send(self.val)?;
        Ok(())
    }
}

/// Rising sawtooth in [0, 1) at the frequency read from `freq`, in hertz.
pub struct Ramp {
    freq: Port,
    out: Port,
    irate: f64,
    phase: f64,
}

impl Ramp {
    pub fn new(freq: Port, out: Port, cfg: &Config) -> Ramp {
        Ramp {
            freq,
            out,
            irate: cfg.irate as f64,
            phase: 0.0,
        }
    }
}

impl Module for Ramp {
    fn name(&self) -> &'static str {
        "ramp"
    }

    fn step(&mut self) -> Result<(), Error> {
        let f = self.freq.recv()?;
        if f != 0.0 {
            self.phase = (self.phase + f as f64 / self.irate).rem_euclid(1.0);
        }
        self.out.send(self.phase as Sample)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::wire;
    use super::*;

    #[test]
    fn const_repeats() {
        let (tx, mut rx) = wire();
        let mut c = Const::new(-0.5, tx);
        for _ in 0..3 {
            c.step().unwrap();
            assert_eq!(rx.recv().unwrap(), -0.5);
        }
    }

    #[test]
    fn ramp_wraps_around() {
        let (mut ftx, frx) = wire();
        let (otx, mut orx) = wire();
        let cfg = Config {
            irate: 4,
            ..Config::default()
        };
        let mut r = Ramp::new(frx, otx, &cfg);

        let mut got = Vec::new();
        for _ in 0..5 {
            ftx.send(1.0).unwrap();
            r.step().unwrap();
            got.push(orx.recv().unwrap());
        }
        assert_eq!(got, vec![0.25, 0.5, 0.75, 0.0, 0.25]);
    }

    #[test]
    fn ramp_holds_at_zero_frequency() {
        let (mut ftx, frx) = wire();
        let (otx, mut orx) = wire();
        let cfg = Config {
            irate: 8,
            ..Config::default()
        };
        let mut r = Ramp::new(frx, otx, &cfg);

        for f in &[2.0, 0.0, 0.0] {
            ftx.send(*f).unwrap();
            r.step().unwrap();
            assert_eq!(orx.recv().unwrap(), 0.25);
        }
    }
}
