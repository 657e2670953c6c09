// Domain layer: records and the ports the updater talks through.

pub mod model;
pub mod ports;
