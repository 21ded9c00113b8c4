use geo::CoordsIter;
use sha2::{Digest, Sha256};

/// Feed a length-prefixed string into a digest.
pub(crate) fn digest_str(hasher: &mut Sha256, s: &str) {
    hasher.update((s.len() as u64).to_le_bytes());
    hasher.update(s.as_bytes());
}

/// Feed every coordinate of a geometry into a digest, prefixed by the coordinate count.
pub(crate) fn digest_coords<G: CoordsIter<Scalar = f64>>(hasher: &mut Sha256, geometry: &G) {
    hasher.update((geometry.coords_count() as u64).to_le_bytes());
    for coord in geometry.coords_iter() {
        hasher.update(coord.x.to_le_bytes());
        hasher.update(coord.y.to_le_bytes());
    }
}

/// Hex SHA-256 of whatever `feed` writes.
pub(crate) fn sha256_hex(feed: impl FnOnce(&mut Sha256)) -> String {
    let mut hasher = Sha256::new();
    feed(&mut hasher);
    hex::encode(hasher.finalize())
}
