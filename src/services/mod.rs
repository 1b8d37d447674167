pub mod device;
mod persist_queue;

pub use device::DeviceService;
pub use persist_queue::PersistQueue;
