// Prelude loading
//
// Backends ship their preludes compiled in; hosts that maintain external
// prelude files can supply them through the filesystem collaborator instead.

use crate::error::{CodegenError, CodegenResult};
use std::io;
use std::path::Path;

/// Optional filesystem collaborator used only to load prelude text
pub trait PreludeSource {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Direct filesystem access for hosts without a virtual filesystem
#[derive(Debug, Default)]
pub struct OsPreludeSource;

impl PreludeSource for OsPreludeSource {
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Read a prelude override from a host filesystem and validate the encoding
pub fn load_prelude(source: &dyn PreludeSource, path: &Path) -> CodegenResult<String> {
    let bytes = source
        .read_file(path)
        .map_err(|e| CodegenError::PreludeLoad(format!("{}: {}", path.display(), e)))?;
    String::from_utf8(bytes)
        .map_err(|_| CodegenError::PreludeLoad(format!("{}: not valid UTF-8", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_prelude_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "// custom prelude").unwrap();
        let text = load_prelude(&OsPreludeSource, file.path()).unwrap();
        assert!(text.contains("custom prelude"));
    }

    #[test]
    fn test_load_prelude_missing_file() {
        let err = load_prelude(&OsPreludeSource, Path::new("/nonexistent/prelude.hlsl"))
            .unwrap_err();
        assert!(matches!(err, CodegenError::PreludeLoad(_)));
    }
}
