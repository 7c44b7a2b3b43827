//! Listen address allocation

use std::net::{SocketAddr, TcpListener};

use crate::error::{HarnessError, HarnessResult};

/// Ask the OS for a free loopback port, release it and hand the address
/// out. The port may in principle be taken again before the instance binds.
pub fn free_address() -> HarnessResult<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(HarnessError::AddressAllocation)?;
    listener.local_addr().map_err(HarnessError::AddressAllocation)
}
