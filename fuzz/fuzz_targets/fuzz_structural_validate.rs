#![no_main]

use anexo::schema::{SchemaValidator, StructuralValidator};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Arbitrary XML must come back as a report, never a panic.
        let _ = StructuralValidator::new().validate(s);
    }
});
