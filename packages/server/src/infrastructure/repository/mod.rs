//! Repository（Persistence Gateway）の実装

pub mod inmemory;

pub use inmemory::InMemoryMessageStore;
