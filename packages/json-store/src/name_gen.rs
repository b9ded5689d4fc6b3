//! Fresh, collision-resistant document names.
//!
//! Names are drawn from the URL-safe base64 alphabet using the thread-local
//! CSPRNG. Generation starts short and only grows the length once a length
//! has failed `tries_per_len` times, so names stay short while the namespace
//! is sparse and generation still terminates when it fills up.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use dirb_bin_store::{ErrorKind, Repository};
use rand::Rng;

use crate::Error;

/// Bounds for name generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameGenConfig {
    min_len: usize,
    max_len: usize,
    tries_per_len: u32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("name length must be positive")]
    ZeroLength,
    #[error("the minimum name length {min} is more than the maximum name length {max}")]
    InvertedRange { min: usize, max: usize },
    #[error("tries per length must be positive")]
    ZeroTries,
}

impl NameGenConfig {
    pub fn new(min_len: usize, max_len: usize, tries_per_len: u32) -> Result<Self, ConfigError> {
        if min_len == 0 {
            return Err(ConfigError::ZeroLength);
        }
        if min_len > max_len {
            return Err(ConfigError::InvertedRange {
                min: min_len,
                max: max_len,
            });
        }
        if tries_per_len == 0 {
            return Err(ConfigError::ZeroTries);
        }
        Ok(NameGenConfig {
            min_len,
            max_len,
            tries_per_len,
        })
    }

    pub fn min_len(&self) -> usize {
        self.min_len
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn tries_per_len(&self) -> u32 {
        self.tries_per_len
    }

    /// Attempts made before giving up.
    pub fn max_attempts(&self) -> u64 {
        (self.max_len - self.min_len + 1) as u64 * u64::from(self.tries_per_len)
    }
}

impl Default for NameGenConfig {
    fn default() -> Self {
        NameGenConfig {
            min_len: 7,
            max_len: 21,
            tries_per_len: 10_000,
        }
    }
}

impl fmt::Display for NameGenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lengths {}..={}, {} tries each",
            self.min_len, self.max_len, self.tries_per_len
        )
    }
}

/// A random name of exactly `len` URL-safe base64 characters.
pub fn generate_name<R: Rng>(rng: &mut R, len: usize) -> String {
    let mut raw = vec![0u8; (len * 3).div_ceil(4)];
    rng.fill(&mut raw[..]);
    let mut name = URL_SAFE_NO_PAD.encode(&raw);
    name.truncate(len);
    name
}

/// Try fresh names with `try_create` until one succeeds.
///
/// `Exists` means "taken, draw again". Every other failure is returned
/// immediately, `Busy` included: contention on a name nobody should know
/// yet points at a bug, not at something to wait out.
pub fn generate_and_create<F>(config: &NameGenConfig, mut try_create: F) -> Result<String, Error>
where
    F: FnMut(&str) -> Result<(), Error>,
{
    let mut rng = rand::thread_rng();
    for len in config.min_len..=config.max_len {
        for _ in 0..config.tries_per_len {
            let name = generate_name(&mut rng, len);
            match try_create(&name) {
                Ok(()) => return Ok(name),
                Err(err) if err.kind() == ErrorKind::Exists => {
                    log::debug!("Generated name {:?} is taken", name);
                }
                Err(err) => return Err(err),
            }
        }
    }

    Err(Error::Exhausted {
        attempts: config.max_attempts(),
    })
}

/// Commit `bytes` under a fresh key in a bin repository.
pub fn create_with_generated_key<R: Repository + ?Sized>(
    repo: &R,
    bytes: &[u8],
    config: &NameGenConfig,
) -> Result<String, Error> {
    generate_and_create(config, |key| {
        repo.create_bytes(key, bytes).map_err(Error::from)
    })
}
