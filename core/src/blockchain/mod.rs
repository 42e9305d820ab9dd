pub mod block_delta;
pub mod block_record;
pub mod coin;
pub mod coin_record;
pub mod network_info;
pub mod sized_bytes;
