#![no_main]
use libfuzzer_sys::fuzz_target;
use storage_access::uri::{parse_object, parse_prefix};

// Parsing must never panic, and whatever parses must re-parse to itself
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };

    for strict in [true, false] {
        if let Ok(prefix) = parse_prefix(input, strict) {
            let canonical = prefix.to_string();
            let reparsed = parse_prefix(&canonical, true).expect("canonical prefix must parse");
            assert_eq!(reparsed, prefix);
        }
    }

    if let Ok(object) = parse_object(input) {
        let reparsed = parse_object(&object.to_string()).expect("canonical object must parse");
        assert_eq!(reparsed, object);
    }
});
