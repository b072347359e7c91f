// Minimal RPM package support.
//
// - `header`:  tag/value header blocks
// - `package`: lead, signature, header and optional archive

pub mod header;
pub mod package;

pub use header::{Header, IndexEntry, TagType};
pub use package::{ArchiveMode, PayloadFormat, RPM_LEAD_MAGIC, RPM_LEAD_SIZE, RpmPackage};
