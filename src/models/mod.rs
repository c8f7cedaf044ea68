pub mod event;
pub mod verdict;

pub use event::{AccessEvent, InvalidIp};
pub use verdict::{AccessPoint, GeoPoint, Verdict};
