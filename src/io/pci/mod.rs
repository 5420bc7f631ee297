
mod address;
mod config;
mod consts;
mod device;
pub use address::PciAddress;
pub use config::PciConfiguration;
pub use device::{PciDevice,PciBar,PciBarAllocation};
