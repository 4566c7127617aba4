#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Malformed schemas must be rejected without panicking.
        let _ = anexo::schema::XsdValidator::from_schema(s);
    }
});
