//! Property tests for the buffered scanner.

use formspill_io::testing::ChunkedSource;
use formspill_io::{ScanError, Scanner};
use futures_executor::block_on;
use proptest::prelude::*;

/// Drain a scanner with `read_line(false)`, concatenating every piece.
fn reassemble(data: &[u8], capacity: usize, chunk: usize) -> Vec<u8> {
    let mut scanner = Scanner::with_capacity(capacity, ChunkedSource::new(data.to_vec(), chunk));
    let mut out = Vec::with_capacity(data.len());
    while let Some(line) = block_on(scanner.read_line(false)).expect("read_line") {
        assert!(line.len() <= scanner_capacity(capacity));
        out.extend_from_slice(line.bytes);
    }
    out
}

fn scanner_capacity(requested: usize) -> usize {
    requested.max(formspill_io::MIN_CAPACITY)
}

fn line_strategy() -> impl Strategy<Value = Vec<u8>> {
    // Lines without CR or LF.
    prop::collection::vec(any::<u8>().prop_filter("no line breaks", |b| *b != b'\r' && *b != b'\n'), 0..12)
}

proptest! {
    #[test]
    fn reading_lines_reproduces_input(
        data in prop::collection::vec(any::<u8>(), 0..2048),
        capacity in 16usize..128,
        chunk in 1usize..64,
    ) {
        prop_assert_eq!(reassemble(&data, capacity, chunk), data);
    }

    #[test]
    fn crlf_split_at_any_fill_boundary_is_invisible(
        lines in prop::collection::vec(line_strategy(), 1..20),
        capacity in 16usize..48,
        chunk in 1usize..32,
    ) {
        // Every line plus its CRLF fits in the buffer, so lines come back whole.
        let mut data = Vec::new();
        for line in &lines {
            data.extend_from_slice(line);
            data.extend_from_slice(b"\r\n");
        }

        let mut scanner = Scanner::with_capacity(capacity, ChunkedSource::new(data, chunk));
        let mut got = Vec::new();
        while let Some(line) = block_on(scanner.read_line(true)).expect("read_line") {
            prop_assert!(line.complete);
            got.push(line.bytes.to_vec());
        }
        prop_assert_eq!(got, lines);
    }

    #[test]
    fn read_slice_never_exceeds_capacity(
        data in prop::collection::vec(any::<u8>(), 0..1024),
        delimiter in any::<u8>(),
        capacity in 16usize..64,
        chunk in 1usize..32,
    ) {
        let mut scanner = Scanner::with_capacity(capacity, ChunkedSource::new(data.clone(), chunk));
        let mut out = Vec::new();
        loop {
            let step = block_on(scanner.read_slice(delimiter)).map(|s| s.map(|l| l.bytes.to_vec()));
            match step {
                Ok(Some(slice)) => {
                    prop_assert!(slice.len() <= capacity);
                    out.extend_from_slice(&slice);
                }
                Ok(None) => break,
                Err(ScanError::BufferFull { len }) => {
                    prop_assert_eq!(len, capacity);
                    prop_assert!(!scanner.buffered().contains(&delimiter));
                    out.extend_from_slice(scanner.buffered());
                    scanner.consume(len);
                }
                Err(other) => return Err(TestCaseError::fail(format!("unexpected error: {other}"))),
            }
        }
        prop_assert_eq!(out, data);
    }
}

#[test]
fn missing_delimiter_beyond_capacity_is_buffer_full() {
    let data = vec![b'z'; 100];
    let mut scanner = Scanner::with_capacity(32, ChunkedSource::new(data, 10));
    let err = block_on(scanner.read_slice(b'\n')).unwrap_err();
    assert!(matches!(err, ScanError::BufferFull { len: 32 }));
    assert_eq!(scanner.buffered().len(), 32);
}
