//! Native serial port implementation using the `serialport` crate.

use {
    crate::{
        error::{Error, Result},
        port::{Port, SerialConfig},
    },
    log::{debug, trace},
    serialport::ClearBuffer,
    std::io::{Read, Write},
};

/// Native serial port implementation.
///
/// A port is created configured but closed; [`NativePort::open`] opens it and
/// treats a second open of an already-open port as success.
pub struct NativePort {
    port: Option<Box<dyn serialport::SerialPort>>,
    config: SerialConfig,
}

impl NativePort {
    /// Create a closed port with the given configuration.
    pub fn new(config: SerialConfig) -> Self {
        Self { port: None, config }
    }

    /// Create a port with the given configuration and open it.
    pub fn connect(config: SerialConfig) -> Result<Self> {
        let mut port = Self::new(config);
        port.open()?;
        Ok(port)
    }

    /// Open the device. Opening an already-open port is a no-op.
    pub fn open(&mut self) -> Result<()> {
        if self.port.is_some() {
            debug!("{} is already open", self.config.port_name());
            return Ok(());
        }

        let config = &self.config;
        let port = serialport::new(config.port_name(), config.baud_rate())
            .timeout(config.timeout())
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|e| Error::DeviceOpen {
                port: config.port_name().to_string(),
                reason: e.to_string(),
            })?;

        trace!(
            "Opened {} at {} baud 8N1, timeout {:?}",
            config.port_name(),
            config.baud_rate(),
            config.timeout()
        );
        self.port = Some(port);
        Ok(())
    }

    /// Whether the device is currently open.
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Close the port and release the device.
    pub fn close(&mut self) {
        self.port.take();
    }

    /// The configuration this port opens with.
    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn inner(&mut self) -> std::io::Result<&mut Box<dyn serialport::SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotConnected, "port closed"))
    }
}

impl Port for NativePort {
    fn name(&self) -> &str {
        self.config.port_name()
    }

    fn clear_input(&mut self) -> Result<()> {
        self.inner()?.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn bytes_to_read(&mut self) -> Result<u32> {
        Ok(self.inner()?.bytes_to_read()?)
    }
}

impl Read for NativePort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner()?.read(buf)
    }
}

impl Write for NativePort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner()?.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner()?.flush()
    }
}
