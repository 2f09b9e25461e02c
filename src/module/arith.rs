use std::f64::consts::PI;

use failure::Error;

use super::{Module, Port};
use crate::Sample;

pub struct Add {
    in1: Port,
    in2: Port,
    out: Port,
}

impl Add {
    pub fn new(in1: Port, in2: Port, out: Port) -> Add {
        Add { in1, in2, out }
    }
}

impl Module for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn step(&mut self) -> Result<(), Error> {
        let (s1, s2) = (self.in1.recv()?, self.in2.recv()?);
        self.out.send(s1 + s2)?;
        Ok(())
    }
}

pub struct Mul {
    in1: Port,
    in2: Port,
    out: Port,
}

impl Mul {
    pub fn new(in1: Port, in2: Port, out: Port) -> Mul {
        Mul { in1, in2, out }
    }
}

impl Module for Mul {
    fn name(&self) -> &'static str {
        "mul"
    }

    fn step(&mut self) -> Result<(), Error> {
        let (s1, s2) = (self.in1.recv()?, self.in2.recv()?);
        self.out.send(s1 * s2)?;
        Ok(())
    }
}

/// Maps a phase in [0, 1) onto one period of a sine.
pub struct SinShp {
    input: Port,
    out: Port,
}

impl SinShp {
    pub fn new(input: Port, out: Port) -> SinShp {
        SinShp { input, out }
    }
}

impl Module for SinShp {
    fn name(&self) -> &'static str {
        "sinshp"
    }

    fn step(&mut self) -> Result<(), Error> {
        let s = self.input.recv()?;
        self.out.send((2.0 * PI * s as f64).sin() as Sample)?;
        Ok(())
    }
}
