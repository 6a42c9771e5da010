use crate::error::WormError;
use crate::lock::LockFile;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};

/// Exclusive access to a storage backend, released on drop.
#[derive(Debug)]
pub struct StorageGuard {
    _lock: Option<LockFile>,
}

impl StorageGuard {
    /// For backends that are only reachable from this process.
    pub fn in_process() -> Self {
        Self { _lock: None }
    }

    pub fn lock_file(lock: LockFile) -> Self {
        Self { _lock: Some(lock) }
    }
}

/// Line-oriented append-only storage.
///
/// `append_line` is all-or-nothing: on error the storage holds exactly the lines it held
/// before the call.
pub trait WormStorage: Send {
    /// Human-readable location for logs and errors.
    fn location(&self) -> String;

    /// Serialize against other writers of the same storage, across processes if needed.
    fn lock(&mut self) -> Result<StorageGuard, WormError>;

    /// Raw bytes of every stored line, without the terminating newline.
    ///
    /// Bytes are returned as stored; a line that is not valid UTF-8 is the verifier's to judge.
    fn read_lines(&self) -> Result<Vec<Vec<u8>>, WormError>;

    fn append_line(&mut self, line: &str) -> Result<(), WormError>;
}

/// JSON-lines file, one entry per line.
#[derive(Clone, Debug)]
pub struct FileStorage {
    path: Utf8PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl WormStorage for FileStorage {
    fn location(&self) -> String {
        self.path.to_string()
    }

    fn lock(&mut self) -> Result<StorageGuard, WormError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| WormError::io(parent, e))?;
        }
        LockFile::acquire(&LockFile::path_for(&self.path)).map(StorageGuard::lock_file)
    }

    fn read_lines(&self) -> Result<Vec<Vec<u8>>, WormError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(split_lines(&bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(WormError::io(&self.path, e)),
        }
    }

    fn append_line(&mut self, line: &str) -> Result<(), WormError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| WormError::io(&self.path, e))?;
        let mut guard = TruncateOnDrop::arm(file, &self.path)?;

        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        guard
            .file
            .write_all(&bytes)
            .and_then(|()| guard.file.sync_data())
            .map_err(|e| WormError::io(&self.path, e))?;

        guard.commit();
        Ok(())
    }
}

/// Split on `\n`; a trailing newline does not start another line.
fn split_lines(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut lines: Vec<Vec<u8>> = bytes.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect();
    if lines.last().is_some_and(Vec::is_empty) {
        lines.pop();
    }
    lines
}

/// Restores the file to its pre-append length unless the append was committed.
struct TruncateOnDrop<'a> {
    file: File,
    len: u64,
    path: &'a Utf8Path,
    committed: bool,
}

impl<'a> TruncateOnDrop<'a> {
    fn arm(file: File, path: &'a Utf8Path) -> Result<Self, WormError> {
        let len = file
            .metadata()
            .map_err(|e| WormError::io(path, e))?
            .len();
        Ok(Self {
            file,
            len,
            path,
            committed: false,
        })
    }

    fn commit(&mut self) {
        self.committed = true;
    }
}

impl Drop for TruncateOnDrop<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        match self.file.set_len(self.len).and_then(|()| self.file.sync_data()) {
            Ok(()) => log::warn!(
                "audit append to {} failed; file restored to {} bytes",
                self.path,
                self.len
            ),
            Err(e) => log::error!(
                "audit append to {} failed and the file could not be restored: {e}",
                self.path
            ),
        }
    }
}

/// In-memory storage for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    lines: Vec<Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines as they would be read back from a JSON-lines file holding `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            lines: split_lines(bytes),
        }
    }

    pub fn lines(&self) -> &[Vec<u8>] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<Vec<u8>> {
        self.lines
    }
}

impl WormStorage for MemoryStorage {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn lock(&mut self) -> Result<StorageGuard, WormError> {
        Ok(StorageGuard::in_process())
    }

    fn read_lines(&self) -> Result<Vec<Vec<u8>>, WormError> {
        Ok(self.lines.clone())
    }

    fn append_line(&mut self, line: &str) -> Result<(), WormError> {
        self.lines.push(line.as_bytes().to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("nested/audit.jsonl")).expect("utf8");
        (dir, path)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let (_dir, path) = temp_log();
        assert!(FileStorage::new(path).read_lines().expect("read").is_empty());
    }

    #[test]
    fn appends_are_newline_terminated() {
        let (_dir, path) = temp_log();
        let mut storage = FileStorage::new(path.clone());
        let _guard = storage.lock().expect("lock");
        storage.append_line("{\"a\":1}").expect("append");
        storage.append_line("{\"a\":2}").expect("append");

        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "{\"a\":1}\n{\"a\":2}\n"
        );
        assert_eq!(storage.read_lines().expect("lines").len(), 2);
    }

    #[test]
    fn uncommitted_append_is_rolled_back() {
        let (_dir, path) = temp_log();
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, "{\"seq\":1}\n").expect("seed");

        {
            let file = OpenOptions::new()
                .append(true)
                .open(&path)
                .expect("open");
            let mut guard = TruncateOnDrop::arm(file, &path).expect("arm");
            guard.file.write_all(b"{\"seq\":2,\"trunc").expect("partial");
        }

        assert_eq!(fs::read_to_string(&path).expect("read"), "{\"seq\":1}\n");
    }

    #[test]
    fn split_keeps_invalid_utf8_and_drops_only_the_final_newline() {
        assert!(split_lines(b"").is_empty());
        assert_eq!(split_lines(b"a\n\xffb\n"), vec![b"a".to_vec(), b"\xffb".to_vec()]);
        assert_eq!(split_lines(b"a\n\nb"), vec![b"a".to_vec(), Vec::new(), b"b".to_vec()]);
    }

    #[test]
    fn invalid_utf8_is_read_back_not_rejected() {
        let (_dir, path) = temp_log();
        fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        fs::write(&path, b"{\"a\":1}\n{\"a\":\"\xff\"}\n").expect("seed");
        let lines = FileStorage::new(path).read_lines().expect("read");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], b"{\"a\":\"\xff\"}".to_vec());
    }

    #[test]
    fn lock_creates_parent_and_releases_on_drop() {
        let (_dir, path) = temp_log();
        let mut storage = FileStorage::new(path.clone());
        let guard = storage.lock().expect("lock");
        assert!(LockFile::path_for(&path).exists());
        drop(guard);
        assert!(!LockFile::path_for(&path).exists());
    }
}
