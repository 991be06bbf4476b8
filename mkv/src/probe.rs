use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::reader::EBML_MAGIC;

const EXTENSIONS: [&str; 2] = ["mkv", "webm"];

/// True if the path ends in `.mkv` or `.webm` (any case).
pub fn has_mkv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

/// True if the stream starts with the EBML magic.
pub fn has_ebml_magic<R: Read>(reader: &mut R) -> std::io::Result<bool> {
    let mut magic = [0u8; 4];
    match reader.read_exact(&mut magic) {
        Ok(()) => Ok(magic == EBML_MAGIC),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}

/// Both the extension and the first four bytes must match.
pub fn probe(path: &Path) -> std::io::Result<bool> {
    if !has_mkv_extension(path) {
        return Ok(false);
    }
    let mut file = File::open(path)?;
    has_ebml_magic(&mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_extensions() {
        assert!(has_mkv_extension(Path::new("a/b/clip.mkv")));
        assert!(has_mkv_extension(Path::new("CLIP.WebM")));
        assert!(!has_mkv_extension(Path::new("clip.mp4")));
        assert!(!has_mkv_extension(Path::new("mkv")));
    }

    #[test]
    fn test_magic() {
        let mut ok = Cursor::new(vec![0x1A, 0x45, 0xDF, 0xA3, 0x9F]);
        assert!(has_ebml_magic(&mut ok).unwrap());
        let mut short = Cursor::new(vec![0x1A, 0x45]);
        assert!(!has_ebml_magic(&mut short).unwrap());
        let mut other = Cursor::new(b"\0\0\0\x20ftyp".to_vec());
        assert!(!has_ebml_magic(&mut other).unwrap());
    }

    #[test]
    fn test_probe_file() {
        let dir = std::env::temp_dir();
        let good = dir.join(format!("mkv-probe-{}.mkv", std::process::id()));
        let bad = dir.join(format!("mkv-probe-{}.webm", std::process::id()));
        std::fs::write(&good, [0x1A, 0x45, 0xDF, 0xA3, 0x42, 0x86]).unwrap();
        std::fs::write(&bad, b"not ebml").unwrap();

        assert!(probe(&good).unwrap());
        assert!(!probe(&bad).unwrap());
        assert!(!probe(&dir.join("missing.txt")).unwrap());

        std::fs::remove_file(good).unwrap();
        std::fs::remove_file(bad).unwrap();
    }
}
