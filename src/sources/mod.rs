//! Where configuration bytes come from and how they are parsed.

mod config_source;
mod file;
mod format;

pub use config_source::ConfigSource;
pub use file::FileSource;
pub use format::Format;
