//! Digitized pulses and their binary recording format.
//!
//! A recording is an `i32` version (0) followed by records of
//! `f64` start time, 3 × `f64` boresight, `i32` bin count and that many `u16` levels.
//! Everything is little-endian.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use nalgebra::Vector3;
use ndarray::Array1;
use tracing::debug;

use crate::error::{RadarError, RadarResult};

pub const FORMAT_VERSION: i32 = 0;

// Range bins decoded per read.
const READ_CHUNK: usize = 4096;

/// One digitized pulse: an ADC level per range bin.
#[derive(Clone, Debug, PartialEq)]
pub struct PulseData {
    // s
    pub start_time: f64,
    // Antenna pointing when the pulse was emitted
    pub boresight: Vector3<f64>,
    pub registry: Array1<u16>,
}

impl PulseData {
    pub fn new(start_time: f64, boresight: Vector3<f64>, registry: Array1<u16>) -> PulseData {
        PulseData {
            start_time,
            boresight,
            registry,
        }
    }

    pub fn num_bins(&self) -> usize {
        self.registry.len()
    }
}

pub struct PulseWriter<W: Write> {
    // None once finished
    inner: Option<W>,
}

impl PulseWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> RadarResult<PulseWriter<BufWriter<File>>> {
        debug!(path = %path.as_ref().display(), "Recording pulses");
        PulseWriter::new(BufWriter::new(File::create(path)?))
    }
}

impl<W: Write> PulseWriter<W> {
    /// Writes the version header.
    pub fn new(mut inner: W) -> RadarResult<PulseWriter<W>> {
        inner.write_i32::<LittleEndian>(FORMAT_VERSION)?;
        Ok(PulseWriter { inner: Some(inner) })
    }

    pub fn write(&mut self, pulse: &PulseData) -> RadarResult<()> {
        let out = self.inner.as_mut().ok_or(RadarError::StreamClosed)?;

        out.write_f64::<LittleEndian>(pulse.start_time)?;
        for x in pulse.boresight.iter() {
            out.write_f64::<LittleEndian>(*x)?;
        }

        let count = i32::try_from(pulse.registry.len())
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many range bins"))?;
        out.write_i32::<LittleEndian>(count)?;
        for level in pulse.registry.iter() {
            out.write_u16::<LittleEndian>(*level)?;
        }
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    /// Flushes and hands back the underlying writer. Further writes fail with
    /// [`RadarError::StreamClosed`].
    pub fn finish(&mut self) -> RadarResult<W> {
        let mut inner = self.inner.take().ok_or(RadarError::StreamClosed)?;
        inner.flush()?;
        Ok(inner)
    }
}

pub struct PulseReader<R: BufRead> {
    inner: R,
    version: i32,
}

impl PulseReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> RadarResult<PulseReader<BufReader<File>>> {
        debug!(path = %path.as_ref().display(), "Reading recorded pulses");
        PulseReader::new(BufReader::new(File::open(path)?))
    }
}

// Maps an end of file inside a record to a truncation error naming the field.
fn field<T>(result: io::Result<T>, name: &'static str) -> RadarResult<T> {
    result.map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => RadarError::TruncatedRecord(name),
        _ => RadarError::Io(e),
    })
}

impl<R: BufRead> PulseReader<R> {
    /// Reads and checks the version header.
    pub fn new(mut inner: R) -> RadarResult<PulseReader<R>> {
        let version = field(inner.read_i32::<LittleEndian>(), "version")?;
        if version != FORMAT_VERSION {
            return Err(RadarError::UnsupportedVersion(version));
        }
        Ok(PulseReader { inner, version })
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    // True when no bytes remain.
    pub fn is_eof(&mut self) -> RadarResult<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    pub fn read_pulse(&mut self) -> RadarResult<PulseData> {
        if self.is_eof()? {
            return Err(RadarError::StreamExhausted);
        }

        let r = &mut self.inner;
        let start_time = field(r.read_f64::<LittleEndian>(), "start time")?;
        let mut boresight = Vector3::<f64>::zeros();
        for x in boresight.iter_mut() {
            *x = field(r.read_f64::<LittleEndian>(), "boresight")?;
        }

        let count = field(r.read_i32::<LittleEndian>(), "bin count")?;
        let count = usize::try_from(count).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, format!("negative bin count {}", count))
        })?;
        // Grow with the bytes actually read, a corrupt count must not allocate up front
        let mut registry = Vec::with_capacity(count.min(READ_CHUNK));
        let mut chunk = [0u16; READ_CHUNK];
        while registry.len() < count {
            let n = (count - registry.len()).min(READ_CHUNK);
            field(r.read_u16_into::<LittleEndian>(&mut chunk[..n]), "registry")?;
            registry.extend_from_slice(&chunk[..n]);
        }

        Ok(PulseData::new(start_time, boresight, Array1::from(registry)))
    }
}

impl<R: BufRead> Iterator for PulseReader<R> {
    type Item = RadarResult<PulseData>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_pulse() {
            Err(RadarError::StreamExhausted) => None,
            other => Some(other),
        }
    }
}
