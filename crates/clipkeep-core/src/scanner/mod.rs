mod walk;

pub use walk::{scan_inventory, Inventory, RejectedEntry};
