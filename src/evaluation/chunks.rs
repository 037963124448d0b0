//! Chunked CSV reading
//!
//! Rows are pulled from the underlying reader `chunk_size` at a time, so
//! only one chunk of raw text is resident at once.

use std::io::Read;

use crate::features::RawBatch;
use crate::AppResult;

pub struct CsvChunks<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    chunk_size: usize,
    rows_read: usize,
    done: bool,
}

impl<R: Read> CsvChunks<R> {
    /// Reads the header line immediately; an empty source yields no chunks
    pub fn new(source: R, chunk_size: usize) -> AppResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(source);
        let headers = reader.headers()?.iter().map(str::to_string).collect();

        Ok(Self {
            reader,
            headers,
            chunk_size: chunk_size.max(1),
            rows_read: 0,
            done: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows handed out so far
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    fn read_chunk(&mut self) -> AppResult<Vec<Vec<String>>> {
        let mut rows = Vec::with_capacity(self.chunk_size);
        let mut record = csv::StringRecord::new();
        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut record)? {
                self.done = true;
                break;
            }
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

impl<R: Read> Iterator for CsvChunks<R> {
    type Item = AppResult<RawBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.read_chunk() {
            Ok(rows) if rows.is_empty() => None,
            Ok(rows) => {
                let offset = self.rows_read;
                self.rows_read += rows.len();
                Some(Ok(RawBatch::new(self.headers.clone(), rows).with_row_offset(offset)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
