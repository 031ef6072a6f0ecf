//! External collaborators: name resolution, datagram transport and wall clock.

pub mod clock;
pub mod resolver;
pub mod transport;

pub use clock::{Clock, SystemClock};
pub use resolver::{Resolver, SystemResolver};
pub use transport::{Connector, Transport, UdpConnector, UdpTransport};
