mod digest;
mod fs;
mod math;
mod polygon;

pub(crate) use digest::{digest_coords, digest_str, sha256_hex};
pub(crate) use fs::*;
pub use math::round2;
pub(crate) use math::{exact_sum, CompensatedSum};
pub(crate) use polygon::*;
