//! インメモリ実装

mod message_store;

pub use message_store::InMemoryMessageStore;
