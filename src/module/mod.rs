use std::io::Write;

use failure::{format_err, Error};

use crate::{Config, Endpoint, Sample};

mod arith;
mod out;
mod source;

pub use arith::{Add, Mul, SinShp};
pub use out::Out;
pub use source::{Const, Ramp};

pub type Port = Box<dyn Endpoint>;

/// A processing stage driven by its own thread.
pub trait Module: Send {
    fn name(&self) -> &'static str;

    /// Consume whatever one output sample needs and produce it.
    fn step(&mut self) -> Result<(), Error>;

    fn run(&mut self) -> Result<(), Error> {
        loop {
            self.step()?;
        }
    }
}

/// What a graph node is, with its static parameters.
pub enum Kind {
    Const(Sample),
    Ramp,
    Add,
    Mul,
    SinShp,
    Out(Box<dyn Write + Send>),
}

impl Kind {
    pub fn name(&self) -> &'static str {
        match self {
            Kind::Const(_) => "constval",
            Kind::Ramp => "ramp",
            Kind::Add => "add",
            Kind::Mul => "mul",
            Kind::SinShp => "sinshp",
            Kind::Out(_) => "out",
        }
    }

    pub fn inputs(&self) -> &'static [&'static str] {
        match self {
            Kind::Const(_) => &[],
            Kind::Ramp => &["freq"],
            Kind::Add | Kind::Mul => &["in1", "in2"],
            Kind::SinShp | Kind::Out(_) => &["in"],
        }
    }

    pub fn outputs(&self) -> &'static [&'static str] {
        match self {
            Kind::Out(_) => &[],
            _ => &["out"],
        }
    }

    pub fn input(&self, port: &str) -> Option<usize> {
        self.inputs().iter().position(|p| *p == port)
    }

    pub fn output(&self, port: &str) -> Option<usize> {
        self.outputs().iter().position(|p| *p == port)
    }

    /// Turn the node into a runnable module. `inputs` and `outputs` are in
    /// port order.
    pub fn build(
        self,
        inputs: Vec<Port>,
        outputs: Vec<Port>,
        cfg: &Config,
    ) -> Result<Box<dyn Module>, Error> {
        let name = self.name();
        let mut i = inputs.into_iter();
        let mut o = outputs.into_iter();
        let take = |ports: &mut std::vec::IntoIter<Port>| {
            ports
                .next()
                .ok_or_else(|| format_err!("{} is missing a port", name))
        };

        let module: Box<dyn Module> = match self {
            Kind::Const(val) => Box::new(Const::new(val, take(&mut o)?)),
            Kind::Ramp => Box::new(Ramp::new(take(&mut i)?, take(&mut o)?, cfg)),
            Kind::Add => Box::new(Add::new(take(&mut i)?, take(&mut i)?, take(&mut o)?)),
            Kind::Mul => Box::new(Mul::new(take(&mut i)?, take(&mut i)?, take(&mut o)?)),
            Kind::SinShp => Box::new(SinShp::new(take(&mut i)?, take(&mut o)?)),
            Kind::Out(w) => Box::new(Out::new(take(&mut i)?, w, cfg)),
        };
        Ok(module)
    }
}
