//! Common surface of every peripheral wrapper.

use crate::error::Result;

/// A named peripheral that can give its hardware back.
///
/// Wrappers log through `log` with [`name`](Device::name) as prefix.
pub trait Device {
    fn name(&self) -> &str;

    /// Put the hardware in a safe state and release it.
    fn release(&mut self) -> Result<()>;
}
