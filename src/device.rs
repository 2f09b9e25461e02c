use std::io::{self, Write};

use bytes::{BufMut, BytesMut};
use log::*;

use crate::{Config, Sample};

/// Scale a sample to the output encoding. Out of range values saturate.
pub fn encode(s: Sample, depth: i16) -> i16 {
    (s * depth as f32) as i16
}

/// Errors that are safe to retry without bothering anyone.
pub fn is_mundane(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::Interrupted
}

/// Write all of `buf`, retrying mundane errors and partial writes.
pub fn ewrite<W: Write + ?Sized>(out: &mut W, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match out.write(buf) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "device accepted no bytes",
                ))
            }
            Ok(n) => buf = &buf[n..],
            Err(e) if is_mundane(&e) => debug!("retrying device write: {}", e),
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Accumulates encoded frames and writes them out one full buffer at a time.
pub struct Device<W: Write> {
    out: W,
    buf: BytesMut,
    size: usize,
    channels: usize,
    depth: i16,
}

impl<W: Write> Device<W> {
    pub fn new(out: W, cfg: &Config) -> Device<W> {
        Device {
            out,
            buf: BytesMut::with_capacity(cfg.obuf),
            size: cfg.obuf,
            channels: cfg.channels,
            depth: cfg.depth,
        }
    }

    pub fn push(&mut self, s: Sample) -> io::Result<()> {
        let v = encode(s, self.depth);
        for _ in 0..self.channels {
            self.buf.put_i16_le(v);
        }
        if self.buf.len() >= self.size {
            trace!("writing {} bytes to device", self.buf.len());
            ewrite(&mut self.out, &self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
