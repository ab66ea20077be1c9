//! Polygon conversion pipeline.
//!
//! Turns a polygon geometry file into a tile container by chaining the
//! external tools from [`crate::tools`] inside a
//! [`ConcatenatedProgress`](crate::progress::ConcatenatedProgress):
//!
//! ```text
//! input.geojson ──tippecanoe──► polytiles-<pid>-<n>.mbtiles ──versatiles──► output
//!                                         └──────────── removed ────────────┘
//! ```

mod pipeline;
mod request;

pub use pipeline::{
    convert_polygons, intermediate_path, remove_file_step, tippecanoe_invocation,
    versatiles_invocation, LAYER_NAME, STAGE_CLEANUP, STAGE_CONVERT, STAGE_GENERATE,
};
pub use request::{ConvertError, ConvertRequest};
