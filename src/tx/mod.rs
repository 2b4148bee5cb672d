// Account blocks: construction, hashing, signing and publishing
pub mod abi;
pub mod block;
pub mod sender;
pub mod templates;

pub use block::AccountBlock;
pub use sender::TransactionSender;
pub use templates::Templates;
