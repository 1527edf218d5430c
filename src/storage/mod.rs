//! Storage layer - the backing page store and the in-memory page image.
//!
//! - [`PageStore`] - contract for durable page read/write and allocation
//! - [`DiskManager`] - file-per-table implementation of [`PageStore`]
//! - [`Page`] - in-memory image of one disk page, with dirty tracking and
//!   a before-image for abort recovery

mod disk_manager;
mod page;
mod store;

pub use disk_manager::DiskManager;
pub use page::Page;
pub use store::PageStore;
