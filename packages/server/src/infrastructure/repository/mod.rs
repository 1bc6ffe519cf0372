//! Repository の実装
//!
//! - `inmemory`: プロセス内のルームレジストリ（arena-with-id）

pub mod inmemory;

pub use inmemory::InMemoryRoomRepository;
