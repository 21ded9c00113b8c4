mod io;
mod zone;

pub use io::read_zones;
pub use zone::{assign_sequential_zone_ids, AttributeValue, Zone};
