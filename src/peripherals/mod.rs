pub mod clock;
pub mod cloud;
pub mod display;
pub mod network;
pub mod sensor;
#[cfg(test)]
pub mod testing;
pub mod transport;

pub use clock::{ClockSource, SystemClock};
pub use cloud::{CloudMirror, CloudSync, HttpCloudSync, LogCloudSync};
pub use display::{LogDisplay, StatusDisplay};
pub use network::{provision, Connectivity, TcpProbe};
pub use sensor::{HttpSensor, SensorReader};
pub use transport::{HttpTransport, IngestTransport};
