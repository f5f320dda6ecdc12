//! Archive inspection for release downloads.
//!
//! Two questions are answered here:
//!
//! - which extraction type the build orchestrator should use, inferred purely
//!   from the download URL ([`ArchiveType::from_url`])
//! - which directory every member of the archive lives under, so it can be
//!   stripped on extraction ([`common_prefix`])
//!
//! The member listing sniffs the actual bytes rather than trusting the URL, so
//! a source tarball served from an extension-less API URL is still read as
//! gzip.

use std::fmt;
use std::io::{Cursor, Read};
use std::path::{Component, Path};
use thiserror::Error;

/// Extraction type written into `http_archive(type = ...)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// gzip-compressed tar
    Tgz,
    /// zip
    Zip,
    /// xz-compressed tar
    Xz,
    /// bzip2-compressed tar
    TarBz2,
}

impl ArchiveType {
    /// Infer from the URL suffix: `.zip`, `.xz`, `.tar.bz2`, anything else is tgz.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        if url.ends_with(".zip") {
            Self::Zip
        } else if url.ends_with(".xz") {
            Self::Xz
        } else if url.ends_with(".tar.bz2") {
            Self::TarBz2
        } else {
            Self::Tgz
        }
    }

    /// The orchestrator's name for this type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tgz => "tgz",
            Self::Zip => "zip",
            Self::Xz => "xz",
            Self::TarBz2 => "tar.bz2",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure to list an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Corrupt tar stream or decompression failure
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Corrupt zip
    #[error("{0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Container format detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// zip
    Zip,
    /// tar + gzip
    Gzip,
    /// tar + xz
    Xz,
    /// tar + bzip2
    Bzip2,
    /// uncompressed tar
    Tar,
}

/// Detect the container format of downloaded bytes.
#[must_use]
pub fn sniff(content: &[u8]) -> Format {
    if content.starts_with(b"PK\x03\x04") || content.starts_with(b"PK\x05\x06") {
        Format::Zip
    } else if content.starts_with(&[0x1f, 0x8b]) {
        Format::Gzip
    } else if content.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
        Format::Xz
    } else if content.starts_with(b"BZh") {
        Format::Bzip2
    } else {
        Format::Tar
    }
}

/// One archive member reduced to what prefix computation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// Path inside the archive
    pub path: String,
    /// Whether the member is a directory
    pub is_dir: bool,
}

/// List the members of an archive held in memory.
pub fn members(content: &[u8]) -> Result<Vec<Member>, ArchiveError> {
    match sniff(content) {
        Format::Zip => zip_members(content),
        Format::Gzip => tar_members(flate2::read::GzDecoder::new(content)),
        Format::Xz => tar_members(xz2::read::XzDecoder::new(content)),
        Format::Bzip2 => tar_members(bzip2::read::BzDecoder::new(content)),
        Format::Tar => tar_members(content),
    }
}

fn zip_members(content: &[u8]) -> Result<Vec<Member>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))?;
    let mut out = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        out.push(Member {
            path: file.name().to_string(),
            is_dir: file.is_dir(),
        });
    }
    Ok(out)
}

fn tar_members<R: Read>(reader: R) -> Result<Vec<Member>, ArchiveError> {
    use tar::EntryType;

    let mut archive = tar::Archive::new(reader);
    let mut out = Vec::new();
    for entry in archive.entries()? {
        let entry = entry?;
        let entry_type = entry.header().entry_type();
        // Extension headers (e.g. the forge's pax_global_header) are not members.
        if matches!(
            entry_type,
            EntryType::XGlobalHeader
                | EntryType::XHeader
                | EntryType::GNULongName
                | EntryType::GNULongLink
        ) {
            continue;
        }
        out.push(Member {
            path: entry.path()?.to_string_lossy().into_owned(),
            is_dir: entry_type.is_dir(),
        });
    }
    Ok(out)
}

/// Directory shared by every member, as a `/`-separated path without a
/// trailing slash. Empty when members do not share a directory.
pub fn common_prefix(content: &[u8]) -> Result<String, ArchiveError> {
    Ok(common_dir(&members(content)?))
}

/// Common leading directory of a member list.
///
/// File names never count as part of the prefix, so an archive holding a
/// single top-level file has an empty prefix.
#[must_use]
pub fn common_dir(members: &[Member]) -> String {
    let mut common: Option<Vec<String>> = None;

    for member in members {
        let mut dirs: Vec<String> = Path::new(&member.path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        if !member.is_dir {
            dirs.pop();
        }

        common = Some(match common {
            None => dirs,
            Some(prev) => prev.into_iter().zip(dirs).take_while(|(a, b)| a == b).map(|(a, _)| a).collect(),
        });
    }

    common.unwrap_or_default().join("/")
}
