// Domain layer: value types and the data-source port. No I/O lives here.

pub mod model;
pub mod ports;
