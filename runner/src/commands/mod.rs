mod benchmark;
mod inspect;
mod translate;

pub use benchmark::benchmark;
pub use inspect::{inspect, validate};
pub use translate::translate;
