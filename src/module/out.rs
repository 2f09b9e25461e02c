use std::io::Write;

use failure::Error;

use super::{Module, Port};
use crate::device::Device;
use crate::Config;

/// Sink that plays its input through a `Device`.
pub struct Out {
    input: Port,
    device: Device<Box<dyn Write + Send>>,
}

impl Out {
    pub fn new(input: Port, out: Box<dyn Write + Send>, cfg: &Config) -> Out {
        Out {
            input,
            device: Device::new(out, cfg),
        }
    }
}

impl Module for Out {
    fn name(&self) -> &'static str {
        "out"
    }

    fn step(&mut self) -> Result<(), Error> {
        let s = self.input.recv()?;
        self.device.push(s)?;
        Ok(())
    }
}
