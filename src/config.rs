use failure::{bail, Error};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Buffered,
    Unbuffered,
}

/// Everything the pipeline needs to know up front. Passed to the graph and
/// to every module that cares; there is no process-wide state.
#[derive(Clone, Debug)]
pub struct Config {
    /// output sample rate in hertz
    pub rate: u32,
    /// internal sample rate, used by oscillators
    pub irate: u32,
    /// full-scale value of the output encoding
    pub depth: i16,
    /// samples per transport buffer
    pub batch: usize,
    /// bytes per device write
    pub obuf: usize,
    pub channels: usize,
    pub transport: TransportKind,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            rate: 44100,
            irate: 44100,
            depth: i16::MAX,
            batch: 1024,
            obuf: 1024,
            channels: 2,
            transport: TransportKind::Buffered,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.rate == 0 || self.irate == 0 {
            bail!("sample rate must be positive");
        }
        if self.batch == 0 {
            bail!("batch size must be positive");
        }
        if self.channels != 1 && self.channels != 2 {
            bail!("unsupported channel count {}", self.channels);
        }
        let frame = 2 * self.channels;
        if self.obuf == 0 || self.obuf % frame != 0 {
            bail!(
                "output buffer of {} bytes is not a whole number of {}-byte frames",
                self.obuf,
                frame
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = vec![
            Config {
                batch: 0,
                ..Config::default()
            },
            Config {
                rate: 0,
                ..Config::default()
            },
            Config {
                channels: 3,
                ..Config::default()
            },
            Config {
                obuf: 1022,
                ..Config::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{:?} accepted", cfg);
        }
    }

    #[test]
    fn mono_allows_two_byte_frames() {
        let cfg = Config {
            channels: 1,
            obuf: 2,
            ..Config::default()
        };
        assert!(cfg.validate().is_ok());
    }
}
