//! Configuration sources: file readers, the component tree and raw
//! property sets.

pub mod format;
pub mod raw;
pub mod reader;
pub mod tree;

pub use format::SourceFormat;
pub use raw::RawConfigProvider;
pub use reader::{open_reader, ConfigReader, PropertiesReader, YamlReader};
pub use tree::{ComponentTree, LazyComponentTree};
