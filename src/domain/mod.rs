// Domain layer: farm records and the ports the resolver pipeline talks through.

pub mod model;
pub mod ports;
