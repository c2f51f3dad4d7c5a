//! Wire payload structs.
//!
//! All payloads are packed little-endian with no padding, mirroring the
//! C structs compiled into the board firmware.

pub use analog_input::AnalogInput;
pub use analog_output::AnalogOutput;
pub use debug_value::DebugValue;
pub use digital_input::DigitalInput;
pub use digital_output::DigitalOutput;
pub use digital_output_bit::DigitalOutputBit;
pub use ghost_car_value::GhostCarValue;
pub use record_ghost_car::RecordGhostCar;
pub use setup_io::SetupIo;
pub use start_ghost_car::StartGhostCar;

mod analog_input;
mod analog_output;
mod debug_value;
mod digital_input;
mod digital_output;
mod digital_output_bit;
mod ghost_car_value;
mod record_ghost_car;
mod setup_io;
mod start_ghost_car;

/// Sentinel for "no pin/channel configured" in signed pin fields.
pub const NO_CHANNEL: i8 = -1;
