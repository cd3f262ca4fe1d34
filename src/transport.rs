//! Byte stream the device session talks through.
//!
//! The session only needs blocking reads bounded by a timeout, writes, and the
//! ability to drop whatever is sitting in the buffers. [`SerialTransport`] provides
//! that on top of the `serialport` crate; tests use a scripted mock.

use crate::msr_tool_error::MsrToolError;
use log::{debug, trace};
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

pub trait Transport {
    /// Reads up to `len` bytes. Fewer bytes come back only when the timeout expired.
    fn read(&mut self, len: usize) -> Result<Vec<u8>, MsrToolError>;

    fn write(&mut self, data: &[u8]) -> Result<(), MsrToolError>;

    fn flush(&mut self) -> Result<(), MsrToolError>;

    /// Drops bytes received but not yet read.
    fn clear_input(&mut self) -> Result<(), MsrToolError>;

    /// Drops bytes written but not yet transmitted.
    fn clear_output(&mut self) -> Result<(), MsrToolError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, len: usize) -> Result<Vec<u8>, MsrToolError> {
        (**self).read(len)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), MsrToolError> {
        (**self).write(data)
    }

    fn flush(&mut self) -> Result<(), MsrToolError> {
        (**self).flush()
    }

    fn clear_input(&mut self) -> Result<(), MsrToolError> {
        (**self).clear_input()
    }

    fn clear_output(&mut self) -> Result<(), MsrToolError> {
        (**self).clear_output()
    }
}

/// Serial line settings the reader ships with.
pub const BAUD_RATE: u32 = 9600;

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialTransport {
    /// Opens `path` at 9600 baud, 8N1, no flow control.
    pub fn open(path: &str, timeout: Duration) -> Result<SerialTransport, MsrToolError> {
        let port = serialport::new(path, BAUD_RATE)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(timeout)
            .open()?;
        debug!("Opened {path} at {BAUD_RATE} baud, timeout {timeout:?}");

        Ok(SerialTransport { port, timeout })
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, len: usize) -> Result<Vec<u8>, MsrToolError> {
        let deadline = Instant::now() + self.timeout;
        let mut buffer = vec![0; len];
        let mut filled = 0;

        while filled < len && Instant::now() < deadline {
            match self.port.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(count) => filled += count,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        buffer.truncate(filled);
        trace!("rx {}", hex::encode(&buffer));

        Ok(buffer)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), MsrToolError> {
        trace!("tx {}", hex::encode(data));
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MsrToolError> {
        self.port.flush()?;
        Ok(())
    }

    fn clear_input(&mut self) -> Result<(), MsrToolError> {
        self.port.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn clear_output(&mut self) -> Result<(), MsrToolError> {
        self.port.clear(ClearBuffer::Output)?;
        Ok(())
    }
}
