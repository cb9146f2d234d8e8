//! CSV output of keyframed positions: `frame,x,y,z`, one row per key.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use nalgebra::Vector3;

use crate::host::KeyframeSink;

pub struct CsvKeyframeWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl CsvKeyframeWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Self::new(file)
    }
}

impl<W: Write> CsvKeyframeWriter<W> {
    /// Wrap `inner` and write the header row.
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(["frame", "x", "y", "z"])?;
        Ok(Self { writer, rows: 0 })
    }

    /// Keyframe rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error().into())
    }
}

impl<W: Write> KeyframeSink for CsvKeyframeWriter<W> {
    fn insert_keyframe(&mut self, frame: i64, position: &Vector3<f64>) -> Result<()> {
        self.writer.write_record([
            frame.to_string(),
            position.x.to_string(),
            position.y.to_string(),
            position.z.to_string(),
        ])?;
        self.rows += 1;
        Ok(())
    }
}
