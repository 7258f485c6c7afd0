// Domain layer: turf models and the ports the host database implements.

pub mod model;
pub mod ports;
