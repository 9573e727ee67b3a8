#![allow(dead_code)]

use sha1::{Digest, Sha1};
use std::io::{Cursor, Write};
use zip::write::FileOptions;

pub fn sha1_hex(data: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// In-memory jar with the given entries
pub fn jar_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        zip.start_file::<&str, ()>(name, FileOptions::default())
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
