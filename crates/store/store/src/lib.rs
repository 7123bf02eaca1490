pub mod blob;
pub mod document;
pub mod error;
pub mod store;
pub mod testing;

pub use blob::EncryptedBlobStore;
pub use document::DocumentStore;
pub use error::StoreError;
pub use store::ObjectStore;
