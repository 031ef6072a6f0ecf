//! NTP wire format, fixed-point time and exchange statistics.

pub mod exchange;
pub mod packet;
pub mod tables;
pub mod timestamp;

pub use exchange::ExchangeResult;
pub use packet::{MODE_CLIENT, MODE_SERVER, PACKET_SIZE, Packet};
