pub mod claims;
pub mod codec;
pub mod errors;

pub use claims::Claims;
pub use claims::Subject;
pub use codec::TokenCodec;
pub use codec::DEFAULT_TTL_SECONDS;
pub use errors::TokenError;
