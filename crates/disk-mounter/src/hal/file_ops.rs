//! File reads (read-only, "world-touching").

use std::io;
use std::path::Path;

pub trait FileOps {
    /// Read the whole file at `path` as UTF-8 text.
    fn read_file_string(&self, path: &Path) -> io::Result<String>;
}
