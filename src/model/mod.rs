pub mod inventory;
pub mod orders;
pub mod queues;
pub mod sku;
