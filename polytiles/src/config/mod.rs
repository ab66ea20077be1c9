//! Configuration file handling.
//!
//! Settings live in an INI file, by default at
//! `<config dir>/polytiles/config.ini`:
//!
//! ```ini
//! [server]
//! listen = 127.0.0.1:5173
//!
//! [tools]
//! tippecanoe = tippecanoe
//! versatiles = versatiles
//! temp_dir =
//!
//! [logging]
//! level = info
//! directory =
//! ```
//!
//! Missing files, sections and keys fall back to defaults. Empty values for
//! optional paths mean "not set". CLI arguments override file values.

mod file;

pub use file::{config_file_path, ConfigError, ConfigFile, ServerSettings, DEFAULT_LISTEN};
