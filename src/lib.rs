//! Driver for MSR605-compatible magnetic stripe readers/writers on a serial line.
//!
//! [`msr::MsrDevice`] runs the command set over any [`transport::Transport`];
//! [`char_bits_conversion`] holds the ISO 7811-2 track coding used by the software
//! read/write paths.

pub mod char_bits_conversion;
pub mod command;
pub mod config;
pub mod data_format;
pub mod frame;
pub mod input;
pub mod iso_mode;
pub mod msr;
pub mod msr_tool_error;
pub mod output;
pub mod raw_tracks_data;
pub mod track;
pub mod track_status;
pub mod tracks_data;
pub mod transport;

pub use msr::MsrDevice;
pub use msr_tool_error::MsrToolError;
