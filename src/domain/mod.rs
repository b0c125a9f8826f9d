// Domain layer: wire models for the storefront endpoints and the ports the controller talks through.

pub mod model;
pub mod ports;
