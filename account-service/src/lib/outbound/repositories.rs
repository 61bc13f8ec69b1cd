pub mod account;
pub mod store;

pub use account::PostgresAccountRepository;
pub use store::AccountStore;
