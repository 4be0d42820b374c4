//! Serial device configuration and open.

use tokio_serial::{DataBits, FlowControl, Parity, SerialStream, StopBits};

use crate::error::Result;

/// Default baud rate for the platform's serial link.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Open the named serial device at the given baud rate.
///
/// The link is configured 8-N-1 with no flow control, matching the platform
/// firmware. Fails if the device is missing, busy, or permission is denied.
pub fn open(path: &str, baud: u32) -> Result<SerialStream> {
    let builder = tokio_serial::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None);
    Ok(SerialStream::open(&builder)?)
}
