use std::fs::File;
use std::path::Path;

use crate::error::ExportError;

pub fn ensure_not_empty<T>(items: &[T]) -> Result<(), ExportError> {
    if items.is_empty() {
        return Err(ExportError::Empty);
    }

    Ok(())
}

pub fn create_output_file(path: impl AsRef<Path>) -> Result<File, ExportError> {
    Ok(File::create(path)?)
}
