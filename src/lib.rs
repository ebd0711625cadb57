#[macro_use]
mod macros;

pub mod config;
pub mod csv_parser;
pub mod error;
pub mod exiftool;
pub mod film;
pub mod modes;
pub mod naming;
pub mod timestamp;

pub use config::{Config, ConfigError, ConfigOverrides};
pub use csv_parser::{CsvParser, EmptyFramePolicy};
pub use error::ParseError;
pub use exiftool::{film_commands, map_frame, ExifTool, TagOp};
pub use film::{Film, Frame};
pub use naming::FilenameGenerator;
pub use timestamp::{CameraTimezone, TimestampFormat};
