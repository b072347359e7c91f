// File-level entry points.
//
// `DeltaRpm::open` / `open_with` wrap the generic decoder with a buffered
// file handle. The handle lives only for the duration of the decode.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::config::ReadOptions;
use crate::delta::DeltaRpm;
use crate::error::Result;

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

impl DeltaRpm {
    /// Read the delta RPM at `path` with default limits.
    ///
    /// On failure nothing is returned; every partially decoded field has
    /// already been released.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, &ReadOptions::default())
    }

    /// Read the delta RPM at `path` with explicit limits.
    pub fn open_with(path: impl AsRef<Path>, opts: &ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(BUF_SIZE, file);
        let delta = Self::from_reader(reader, path.to_string_lossy(), opts)?;
        log::debug!(
            "{}: version {} {} delta, {} -> {}",
            delta.filename(),
            delta.version(),
            delta.delta_type(),
            delta.src_nevr(),
            delta.tgt_nevr()
        );
        Ok(delta)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
