pub mod cipher;
pub mod errors;

pub use cipher::TransportEncryptor;
pub use errors::EncryptionError;
