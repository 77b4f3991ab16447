//! Mock collaborators for testing and development.
//!
//! These stand in for a real supervisor check and a real USB bus, and can be
//! driven programmatically from tests.

pub mod discovery;
pub mod prober;

pub use discovery::{MockUsbDiscovery, MockUsbDiscoveryHandle};
pub use prober::{MockProber, StaticProber};
