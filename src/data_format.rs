use crate::msr_tool_error::MsrToolError;
use std::str::FromStr;

/// How track content is exchanged with the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    /// ISO 7811 text, one string per track
    Iso,
    /// Recorded bytes, one hex string per track
    Raw,
}

impl FromStr for DataFormat {
    type Err = MsrToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "iso" => Ok(DataFormat::Iso),
            "raw" => Ok(DataFormat::Raw),
            _ => Err(MsrToolError::UnsupportedDataFormat),
        }
    }
}
