use crate::config::CrawlResult;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Writes a crawl result as pretty-printed JSON.
pub struct CrawlResultWriter<'a> {
    result: &'a CrawlResult,
}

impl<'a> CrawlResultWriter<'a> {
    pub fn new(result: &'a CrawlResult) -> Self {
        Self { result }
    }

    /// Creates or truncates `path`.
    pub fn write(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self.result)?;
        writeln!(writer)
    }
}
