#![no_main]

use libfuzzer_sys::fuzz_target;
use wlcgsgas::loader::rows_to_records;
use wlcgsgas::source::{parse_csv_rows, parse_json_rows};

fuzz_target!(|data: &[u8]| {
    if let Ok(rows) = parse_json_rows(data) {
        let _ = rows_to_records(rows);
    }
    if let Ok(rows) = parse_csv_rows(data) {
        let _ = rows_to_records(rows);
    }
});
