pub mod consume;
pub mod context;
pub mod delimiter;
pub mod eof;
pub mod error;
pub mod format;
pub mod framer;
#[cfg(any(test, feature = "testing"))]
pub mod memory;
pub mod metadata;
pub mod produce;

pub use consume::{ConsumeOptions, ConsumeReport, ReceiveLoop, resolve_partitions, run_consumer};
pub use context::RunContext;
pub use delimiter::{DelimiterError, parse_delimiter};
pub use eof::{EofOutcome, PartitionEofTracker};
pub use error::EngineError;
pub use format::{CompiledFormat, Field, FormatError, RenderOptions, Renderer, Token};
pub use framer::{FileOutcome, Framer, FramerConfig, read_file_record};
#[cfg(any(test, feature = "testing"))]
pub use memory::MemoryBroker;
pub use metadata::{write_metadata_json, write_metadata_text};
pub use produce::{
    FilesReport, ProduceInput, ProduceOptions, ProduceReport, ProduceStats, SendLoop, run_producer,
};
