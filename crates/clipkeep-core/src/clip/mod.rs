mod extension;
mod parser;
mod record;

pub use extension::{AllowList, AudioExtension};
pub use parser::{parse_clip, FileMeta, TIMESTAMP_LAYOUT};
pub use record::{newest_first, oldest_first, ClipRecord};
