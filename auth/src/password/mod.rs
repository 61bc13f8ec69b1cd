pub mod errors;
pub mod hasher;
pub mod record;

pub use errors::PasswordError;
pub use hasher::PasswordHasher;
pub use hasher::DEFAULT_ITERATIONS;
pub use record::PasswordRecord;
