//! Frame integrity checks.
//!
//! Each check is a pure function over a byte slice; callers select the span the
//! protocol covers, e.g., `&buf[start..start + len]`. None keep state between calls so
//! they are safe to use concurrently.
mod crc24q;
mod crc32;
mod sum;

pub use crc24q::*;
pub use crc32::*;
pub use sum::*;
