// crates/amdados-io/src/result_stream.rs

//! Atomic-append writer for the binary result file: a packed sequence
//! of four little-endian single-precision floats per record
//! (`time_index`, `global_x`, `global_y`, `value`). Record order is not
//! significant; the external reader sorts lexicographically by
//! `(t, x, y)`.

use amdados_core::error::AmdadosError;
use byteorder::{LittleEndian, WriteBytesExt};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Thread-safe append-only handle onto the result file. Every snapshot
/// emission from every subdomain's task can hold a shared reference and
/// call `append`/`append_many`; the internal mutex serializes writes so
/// no two tasks interleave a partial record.
pub struct ResultStream {
    writer: Mutex<BufWriter<File>>,
}

impl ResultStream {
    /// Create (truncating) the result file at `path`.
    pub fn create(path: &Path) -> Result<Self, AmdadosError> {
        let file = File::create(path)?;
        Ok(Self { writer: Mutex::new(BufWriter::new(file)) })
    }

    /// Append one `(time_index, global_x, global_y, value)` record.
    pub fn append(&self, time_index: usize, global_x: usize, global_y: usize, value: f64) -> Result<(), AmdadosError> {
        let mut w = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        write_record(&mut *w, time_index, global_x, global_y, value)
    }

    /// Append a batch of records under a single lock acquisition, used
    /// by the snapshot observer to flush one subdomain's contribution
    /// at once rather than node-by-node.
    pub fn append_many(&self, records: &[(usize, usize, usize, f64)]) -> Result<(), AmdadosError> {
        let mut w = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for &(t, x, y, v) in records {
            write_record(&mut *w, t, x, y, v)?;
        }
        Ok(())
    }

    /// Flush any buffered bytes to disk. The driver calls this once at
    /// the end of the run; individual appends stay buffered for
    /// throughput.
    pub fn flush(&self) -> Result<(), AmdadosError> {
        let mut w = self
            .writer
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        w.flush()?;
        Ok(())
    }
}

fn write_record<W: Write>(w: &mut W, time_index: usize, global_x: usize, global_y: usize, value: f64) -> Result<(), AmdadosError> {
    w.write_f32::<LittleEndian>(time_index as f32)?;
    w.write_f32::<LittleEndian>(global_x as f32)?;
    w.write_f32::<LittleEndian>(global_y as f32)?;
    w.write_f32::<LittleEndian>(value as f32)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::ReadBytesExt;
    use std::io::Cursor;

    #[test]
    fn append_writes_four_little_endian_floats() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field_Nx4_Ny4_Nt1.bin");
        let stream = ResultStream::create(&path).unwrap();
        stream.append(0, 1, 2, 3.5).unwrap();
        stream.flush().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 16);
        let mut cursor = Cursor::new(bytes);
        assert_eq!(cursor.read_f32::<LittleEndian>().unwrap(), 0.0);
        assert_eq!(cursor.read_f32::<LittleEndian>().unwrap(), 1.0);
        assert_eq!(cursor.read_f32::<LittleEndian>().unwrap(), 2.0);
        assert_eq!(cursor.read_f32::<LittleEndian>().unwrap(), 3.5);
    }

    #[test]
    fn append_many_writes_records_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("field_Nx4_Ny4_Nt1.bin");
        let stream = ResultStream::create(&path).unwrap();
        stream
            .append_many(&[(0, 0, 0, 1.0), (0, 0, 1, 2.0)])
            .unwrap();
        stream.flush().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 32);
    }
}
