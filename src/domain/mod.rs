// Domain layer: table models and the ports the collectors and pipeline are written against.

pub mod model;
pub mod ports;
