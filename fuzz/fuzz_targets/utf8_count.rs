#![no_main]

use libfuzzer_sys::fuzz_target;
use pgwire_protocol::utf8::{exact_char_count, pessimistic_char_count};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let total = text.chars().count();

    let mut previous = 0;
    for k in 0..=data.len() {
        let pessimistic = pessimistic_char_count(data, 0, k);
        assert!(pessimistic >= previous);
        assert!(pessimistic <= exact_char_count(data, 0, k));
        assert!(pessimistic <= total);
        if text.is_char_boundary(k) {
            assert_eq!(pessimistic, text[..k].chars().count());
        }
        previous = pessimistic;
    }
});
