#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pgwire_codec::{Buffer, IoTransport, Transport};
use pgwire_types::driver::{drive_read, drive_write};
use pgwire_types::{ChunkedRead, DirectWrite, EncodeWrite};

/// A value and the buffer it travels through.
#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u8,
    as_chars: bool,
    text: String,
}

fuzz_target!(|input: Input| {
    let capacity = usize::from(input.capacity).max(1);
    let mut out = IoTransport::new(std::io::Cursor::new(Vec::new()));
    let mut buf = Buffer::new(capacity);

    if input.as_chars {
        let mut write = EncodeWrite::from_chars(input.text.chars().collect());
        drive_write(&mut out, &mut buf, |b| write.step(b)).unwrap();
    } else {
        let mut write = DirectWrite::from_string(input.text.clone());
        drive_write(&mut out, &mut buf, |b| write.step(b)).unwrap();
    }
    out.drain(&mut buf).unwrap();

    let written = out.into_inner().into_inner();
    assert_eq!(written, input.text.as_bytes());

    let mut input_side = IoTransport::new(std::io::Cursor::new(written));
    let mut read = ChunkedRead::<String>::new(input.text.len());
    let back = drive_read(&mut input_side, &mut buf, |b| read.step(b)).unwrap();
    assert_eq!(back, input.text);
});
