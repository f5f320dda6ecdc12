//! In-memory archive builders.
//!
//! Entries are `(path, content)` pairs. Paths ending in `/` become directory
//! entries; parent directories are not added implicitly.

use std::io::{Cursor, Write};

/// Uncompressed tar.
#[must_use]
pub fn tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        if path.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
        } else {
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
        }
        header.set_cksum();
        builder
            .append_data(&mut header, path.trim_end_matches('/'), *content)
            .expect("append tar entry");
    }
    builder.into_inner().expect("finish tar")
}

/// gzip-compressed tar.
#[must_use]
pub fn tar_gz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar(entries)).expect("gzip tar");
    encoder.finish().expect("finish gzip")
}

/// xz-compressed tar.
#[must_use]
pub fn tar_xz(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
    encoder.write_all(&tar(entries)).expect("xz tar");
    encoder.finish().expect("finish xz")
}

/// bzip2-compressed tar.
#[must_use]
pub fn tar_bz2(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
    encoder.write_all(&tar(entries)).expect("bzip2 tar");
    encoder.finish().expect("finish bzip2")
}

/// zip.
#[must_use]
pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (path, content) in entries {
        if path.ends_with('/') {
            writer.add_directory(*path, options).expect("add zip directory");
        } else {
            writer.start_file(*path, options).expect("start zip entry");
            writer.write_all(content).expect("write zip entry");
        }
    }
    writer.finish().expect("finish zip").into_inner()
}
