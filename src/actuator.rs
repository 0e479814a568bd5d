// src/actuator.rs

use crate::error::ActuatorError;
use crate::types::Selection;
use std::io::Write;
use std::time::Duration;
use tracing::info;

const WRITE_TIMEOUT: Duration = Duration::from_secs(1);
// The attached signal controller resets when the port opens; give it time to
// come back before the first command.
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Sink for arbitration decisions. One call per cycle; delivery is
/// fire-and-forget from the control loop's perspective.
pub trait SignalActuator {
    fn emit(&mut self, selection: Selection) -> Result<(), ActuatorError>;
}

/// Wire form of a selection: the decimal lane identifier followed by a
/// newline, or `-1\n` for all-red. ASCII; nothing else is defined.
pub fn encode_command(selection: Selection) -> String {
    format!("{}\n", selection.command_id())
}

/// Transmits selections over a serial link to the physical signal controller.
pub struct SerialActuator<W: Write> {
    port: W,
}

impl SerialActuator<Box<dyn serialport::SerialPort>> {
    pub fn open(port: &str, baud_rate: u32) -> Result<Self, ActuatorError> {
        let handle = serialport::new(port, baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|source| ActuatorError::Open {
                port: port.to_string(),
                source,
            })?;
        std::thread::sleep(SETTLE_DELAY);
        info!("✓ Serial link open on {} @ {} baud", port, baud_rate);
        Ok(Self { port: handle })
    }
}

impl<W: Write> SignalActuator for SerialActuator<W> {
    fn emit(&mut self, selection: Selection) -> Result<(), ActuatorError> {
        self.port.write_all(encode_command(selection).as_bytes())?;
        self.port.flush()?;
        Ok(())
    }
}
