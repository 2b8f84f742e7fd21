pub mod components;
pub mod coverage;
pub mod implementations;
pub mod order_builder;
pub mod packing;
pub mod traits;
