// Domain layer: core models and ports (interfaces) shared by the board and its adapters.

pub mod model;
pub mod ports;
