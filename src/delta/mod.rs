// Delta RPM container decoding.
//
// - `record`: DeltaRpm, DeltaType, Tag and the tag query API
// - `reader`: magic dispatch, variant prefixes, shared tail
// - `source`: CompressedReader / EmbeddedRpmSource seams

pub mod reader;
pub mod record;
pub mod source;

pub use reader::{MIN_LEAD_LEN, RPMONLY_MAGIC, STANDARD_MAGIC};
pub use record::{DeltaRpm, DeltaType, Tag};
pub use source::{CompressedReader, EmbeddedRpmSource};
