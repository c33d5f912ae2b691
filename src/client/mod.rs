//! Storefront cart client. Keeps a guest cart in local storage, talks to the
//! server's `/cart` routes for signed-in buyers and queues changes made while
//! the server cannot be reached.

pub mod availability;
pub mod catalog;
pub mod queue;
pub mod remote;
pub mod session;
pub mod storage;

pub use availability::{Availability, BackendAvailability};
pub use catalog::{Catalog, CatalogProduct};
pub use queue::{CartAction, SyncOperation};
pub use remote::{Credentials, HttpCartClient, RemoteCart, RemoteError};
pub use session::{CartItemId, CartLine, CartOutcome, CartSession, MigrationReport, SyncReport};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError, VendorProfileDraft};
