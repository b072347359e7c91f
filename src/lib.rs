//! drpm: reader for delta-RPM (DRPM) containers.
//!
//! A delta RPM lets a package manager rebuild a target RPM from an installed
//! source package plus a small patch. This crate decodes the container
//! metadata of both variants (rpm-only and standard) in format versions 1-3.
//!
//! The crate provides:
//! - The delta decoder and its query API (`delta`)
//! - Transparent decompression of the delta stream (`compress`)
//! - A minimal RPM lead/signature/header reader (`rpm`)
//! - File-oriented entry points (`io`)
//!
//! # Delta stream compression
//!
//! The delta tail is decompressed on the fly. Supported: uncompressed,
//! gzip (`gzip` feature), bzip2 (`bzip2` feature), xz and lzma-alone
//! (`lzma` feature, via liblzma). All three features are on by default.
//!
//! lzip streams are recognized by their magic but cannot be decoded;
//! reading one fails with [`ErrorKind::Format`]. A [`Compression::Lzip`]
//! value can still appear as the *target* payload compression, since that
//! field is only reported, never decoded.
//!
//! # Quick Start
//!
//! ```no_run
//! use drpm::{DeltaRpm, Tag};
//!
//! let delta = DeltaRpm::open("bash-5.2.21_5.2.26.x86_64.drpm").unwrap();
//! println!(
//!     "{} -> {} (format version {})",
//!     delta.get_string(Tag::SrcNevr).unwrap(),
//!     delta.get_string(Tag::TgtNevr).unwrap(),
//!     delta.get_uint(Tag::Version).unwrap(),
//! );
//! delta.close();
//! ```

pub mod codec;
pub mod compress;
pub mod config;
pub mod delta;
pub mod digest;
pub mod error;
pub mod io;
pub mod rpm;

pub use compress::Compression;
pub use config::ReadOptions;
pub use delta::{DeltaRpm, DeltaType, Tag};
pub use error::{Error, ErrorKind, Result};
pub use rpm::{ArchiveMode, RpmPackage};
