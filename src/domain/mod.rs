// Domain layer: payload models and ports (interfaces). No HTTP or configuration concerns here.

pub mod model;
pub mod ports;
