#![no_main]

use libfuzzer_sys::fuzz_target;
use pgwire_protocol::escape::{
    decode_bytea_text, decode_escaped, decoded_escaped_len, encode_escaped, skip_escaped,
};

fuzz_target!(|data: &[u8]| {
    // Arbitrary input is trusted, never rejected.
    let decoded = decode_escaped(data);
    assert_eq!(decoded.len(), decoded_escaped_len(data));
    assert_eq!(skip_escaped(data, decoded.len()), data.len());

    // Encoding any bytes must decode back to them.
    let mut encoded = Vec::new();
    encode_escaped(data, &mut encoded);
    assert_eq!(decode_escaped(&encoded), data);

    let _ = decode_bytea_text(data);
});
