//! Experience storage.

pub mod replay_buffer;

pub use replay_buffer::ReplayBuffer;
