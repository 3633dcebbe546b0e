//! Result shaping.
//!
//! ```text
//! RawTable { name, columns: [{ name, type, values }] }
//!        │
//!        ▼  shape(tables, ResultFormat)
//! ┌───────────────┬──────────────────────────────┬──────────────────────────┐
//! │ table         │ time_series                  │ adx_time_series          │
//! │ one frame per │ one frame per numeric column │ one frame per row and    │
//! │ result set    │ and label combination        │ numeric array column     │
//! └───────────────┴──────────────────────────────┴──────────────────────────┘
//! ```
//!
//! Structural problems are a [`FormatError`]; an unsorted time field is only
//! a [`Notice`].

mod error;
mod frame;
mod shaper;

pub use error::{FormatError, ShapeResult};
pub use frame::{Field, FieldValues, Frame, Label, Notice, RawColumn, RawTable, ShapedResult};
pub use shaper::{is_non_decreasing, series_name, shape, shape_table, TIMESTAMP_COLUMN};
