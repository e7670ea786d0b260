// Domain layer: report migration models and ports (interfaces).

pub mod model;
pub mod ports;
