use rand::{Rng, RngCore};
use sds_fstream::{FileStream, OpenMode, SeekOrigin, StatusRegister, INVALID_SIZE};
use std::path::PathBuf;

/// Scratch file in the temp dir, removed on drop
struct Scratch {
    path: PathBuf,
}

impl Scratch {
    fn new(tag: &str) -> Self {
        let id: u64 = rand::thread_rng().gen();
        let path = std::env::temp_dir().join(format!("sds-fstream-{}-{:016x}.bin", tag, id));
        Self { path }
    }

    fn with_contents(tag: &str, contents: &[u8]) -> Self {
        let scratch = Self::new(tag);
        std::fs::write(&scratch.path, contents).unwrap();
        scratch
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn random_bytes(count: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; count];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[test]
fn test_end_modes_start_at_file_size() {
    let scratch = Scratch::with_contents("end", &random_bytes(1234));

    for mode in [
        OpenMode::ReadOnlyFromEnd,
        OpenMode::WriteKeepExistingFromEnd,
        OpenMode::ReadWriteKeepExistingFromEnd,
    ] {
        let mut stream = FileStream::open_path(&scratch.path, mode);
        assert!(stream.is_open(), "{:?}", mode);
        let position = stream.tell();
        assert_eq!(position, 1234);
        assert_eq!(position, stream.file_size(false), "{:?}", mode);
        assert!(stream.good());
    }
}

#[test]
fn test_round_trip_sizes() {
    let page = 4096;
    for mode in [OpenMode::ReadWriteKeepExisting, OpenMode::ReadWriteKeepExistingFromEnd] {
        for size in [0usize, 1, 4096, page * 3 + 17] {
            let scratch = Scratch::with_contents("roundtrip", b"");
            let payload = random_bytes(size);

            let mut stream = FileStream::open_path(&scratch.path, mode);
            assert!(stream.is_open(), "{:?}", mode);
            assert_eq!(stream.write(&payload), size, "{:?} size {}", mode, size);
            assert_eq!(stream.file_size(false), size);

            stream.seek(0, SeekOrigin::Begin);
            let mut back = vec![0u8; size];
            assert_eq!(stream.read(&mut back), size, "{:?} size {}", mode, size);
            assert_eq!(back, payload);
            assert!(stream.good());
        }
    }
}

#[test]
fn test_read_write_same_stream() {
    let scratch = Scratch::with_contents("rw", b"");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::ReadWriteKeepExisting);

    assert_eq!(stream.write(b"hello world"), 11);
    stream.seek(6, SeekOrigin::Begin);
    let mut buf = [0u8; 5];
    assert_eq!(stream.read(&mut buf), 5);
    assert_eq!(&buf, b"world");
    assert_eq!(stream.status(), StatusRegister::empty());
}

#[test]
fn test_read_on_discard_stream_is_refused() {
    let scratch = Scratch::with_contents("discard", b"previous contents");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::WriteDiscardExisting);
    assert_eq!(stream.file_size(true), 0);

    assert_eq!(stream.write(b"abc"), 3);
    let mut buf = [0u8; 3];
    assert_eq!(stream.read(&mut buf), INVALID_SIZE);
    assert!(stream.status().contains(StatusRegister::FAIL));

    // Position untouched by the refused read
    assert_eq!(stream.write(b"def"), 3);
    stream.close();
    assert_eq!(std::fs::read(&scratch.path).unwrap(), b"abcdef");
}

#[test]
fn test_eof_is_good_until_cleared() {
    let scratch = Scratch::with_contents("eof", b"0123456789");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::ReadOnly);

    let mut buf = [0u8; 16];
    assert_eq!(stream.read(&mut buf), 10);
    assert!(stream.is_eof());
    assert!(stream.good());

    // At or past the observed end: EOF stays
    stream.seek(0, SeekOrigin::End);
    assert_eq!(stream.status(), StatusRegister::EOF);
    stream.seek(12, SeekOrigin::Begin);
    assert_eq!(stream.status(), StatusRegister::EOF);

    // Strictly before it: register cleared
    stream.seek(9, SeekOrigin::Begin);
    assert_eq!(stream.status(), StatusRegister::empty());
    assert_eq!(stream.read(&mut buf[..1]), 1);
    assert_eq!(buf[0], b'9');
    assert!(!stream.is_eof());
}

#[test]
fn test_nonexistent_path() {
    let scratch = Scratch::new("missing");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::ReadOnly);
    assert!(!stream.is_open());
    assert!(!stream.good());

    let mut buf = [0u8; 8];
    assert_eq!(stream.read(&mut buf), INVALID_SIZE);
    assert_eq!(stream.status(), StatusRegister::FAIL);

    assert!(FileStream::create(&scratch.path, OpenMode::ReadWriteKeepExisting).is_err());
    assert!(!scratch.path.exists());
}

#[test]
fn test_keep_modes_require_existing_file() {
    let scratch = Scratch::new("keep");
    for mode in [OpenMode::WriteKeepExisting, OpenMode::ReadWriteKeepExistingFromEnd] {
        let stream = FileStream::open_path(&scratch.path, mode);
        assert!(!stream.is_open());
    }
    assert!(!scratch.path.exists());
}

#[test]
fn test_durable_sync_after_write() {
    let scratch = Scratch::new("sync");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::WriteDiscardExisting);
    assert_eq!(stream.write(&random_bytes(10)), 10);
    assert_eq!(stream.flush(), 0);

    stream.durable_sync(true);
    assert_eq!(stream.status(), StatusRegister::empty());
    stream.durable_sync(false);
    assert_eq!(stream.status(), StatusRegister::empty());
}

#[test]
fn test_typed_values_on_disk() {
    let scratch = Scratch::new("typed");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::WriteDiscardExisting);
    assert_eq!(stream.write_value(42u16), 2);
    assert_eq!(stream.write_value(true), 1);
    assert_eq!(stream.write_value(-7i64), 8);
    stream.close();

    let bytes = std::fs::read(&scratch.path).unwrap();
    assert_eq!(bytes.len(), 11);
    assert_eq!(bytes[2], 1);

    let mut stream = FileStream::open_path(&scratch.path, OpenMode::ReadOnly);
    assert_eq!(stream.read_scalar::<u16>(), Ok(42));
    assert_eq!(stream.read_scalar::<bool>(), Ok(true));
    assert_eq!(stream.read_scalar::<i64>(), Ok(-7));
    assert!(stream.read_scalar::<u8>().is_err());
    assert!(stream.is_eof());
}

#[test]
fn test_reopen_resets_state() {
    let scratch = Scratch::with_contents("reopen", b"abc");
    let mut stream = FileStream::open_path(&scratch.path, OpenMode::ReadOnly);
    assert_eq!(stream.write(b"x"), INVALID_SIZE);
    assert!(!stream.good());

    stream.open(&scratch.path, OpenMode::ReadOnlyFromEnd);
    assert!(stream.good());
    assert_eq!(stream.tell(), 3);
}
