use clap::{ArgAction, Parser, Subcommand};
use env_logger::Env;
use log::{debug, error};
use msr605_tool::config::{Coercivity, Density};
use msr605_tool::data_format::DataFormat;
use msr605_tool::input::{parse_raw_tracks, parse_tracks, InputFormat};
use msr605_tool::msr::Led;
use msr605_tool::output::{format_raw_tracks, format_tracks, OutputFormat};
use msr605_tool::transport::SerialTransport;
use msr605_tool::{MsrDevice, MsrToolError};
use std::process;
use std::time::Duration;

/// Simple tool for reading and writing data to magstripe devices
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial device of the reader, e.g. /dev/ttyUSB0
    #[arg(short, long)]
    device: String,

    /// Seconds to wait for a reply, card swipes included
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    /// Skip the communication, RAM and sensor tests on startup
    #[arg(long)]
    skip_tests: bool,

    /// More output, repeat for frame dumps
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[clap(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Read all tracks
    Read {
        /// iso or raw
        #[arg(short, long, default_value = "iso")]
        format: DataFormat,
        /// Decode a raw read in software instead of on the device
        #[arg(long)]
        soft: bool,
        /// combined or lines
        #[arg(short, long, default_value = "combined")]
        output: OutputFormat,
        #[arg(short, long, default_value_t = '_')]
        separator: char,
    },
    /// Write all tracks
    Write {
        /// Tracks joined by the separator, hex per track for raw
        data: String,
        /// iso or raw
        #[arg(short, long, default_value = "iso")]
        format: DataFormat,
        /// Encode in software and write raw
        #[arg(long)]
        soft: bool,
        #[arg(short, long, default_value_t = '_')]
        separator: char,
    },
    /// Erase tracks, all of them when none is selected
    Erase {
        #[arg(long)]
        track1: bool,
        #[arg(long)]
        track2: bool,
        #[arg(long)]
        track3: bool,
    },
    /// Reset the device
    Reset,
    /// Run communication, RAM and sensor tests
    SelfTest,
    /// Show device model
    Model,
    /// Show firmware version
    Firmware,
    /// Show or set coercivity (hi, lo)
    Coercivity { mode: Option<Coercivity> },
    /// Set recording density per track (75 or 210)
    Bpi {
        track1: Density,
        track2: Density,
        track3: Density,
    },
    /// Set bits per character per track
    Bpc { track1: u8, track2: u8, track3: u8 },
    /// Show or set leading zeros for tracks 1/3 and track 2
    LeadingZero { track13: Option<u8>, track2: Option<u8> },
    /// Switch LEDs (off, on, green, yellow, red)
    Led { state: Led },
}

fn main() {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_target(args.verbose >= 2)
        .init();
    debug!("msr605-tool v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), MsrToolError> {
    let transport = SerialTransport::open(&args.device, Duration::from_secs(args.timeout))?;
    let mut msr = MsrDevice::new(transport);
    if args.skip_tests {
        msr.reset()?;
    } else {
        msr.initialize()?;
    }

    match args.command {
        Action::Read {
            format,
            soft,
            output,
            separator,
        } => {
            println!("Swipe card to read");
            let text = match format {
                DataFormat::Iso => {
                    format_tracks(&msr.read_tracks_iso(soft)?, output, Some(separator))
                }
                DataFormat::Raw => {
                    format_raw_tracks(&msr.read_tracks_raw()?, output, Some(separator))
                }
            };
            println!("{text}");
        }
        Action::Write {
            data,
            format,
            soft,
            separator,
        } => {
            match format {
                DataFormat::Iso => {
                    let tracks = parse_tracks(&data, &InputFormat::Combined, &separator)?;
                    // validated before the swipe prompt
                    tracks.strip_sentinels().validate()?;
                    println!("Swipe card to write");
                    msr.write_tracks_iso(&tracks, soft)?;
                }
                DataFormat::Raw => {
                    let tracks = parse_raw_tracks(&data, &InputFormat::Combined, &separator)?;
                    println!("Swipe card to write");
                    msr.write_tracks_raw(&tracks)?;
                }
            }
            println!("Written");
        }
        Action::Erase {
            track1,
            track2,
            track3,
        } => {
            let all = !(track1 || track2 || track3);
            println!("Swipe card to erase");
            msr.erase(track1 || all, track2 || all, track3 || all)?;
            println!("Erased");
        }
        Action::Reset => msr.reset()?,
        Action::SelfTest => {
            msr.run_self_tests()?;
            println!("All tests passed");
        }
        Action::Model => println!("{}", msr.get_device_model()?),
        Action::Firmware => println!("{}", msr.get_firmware_version()?),
        Action::Coercivity { mode } => match mode {
            Some(coercivity) => msr.set_coercivity(coercivity)?,
            None => println!("{:?}", msr.get_coercivity()?),
        },
        Action::Bpi {
            track1,
            track2,
            track3,
        } => msr.select_bpi(track1, track2, track3)?,
        Action::Bpc {
            track1,
            track2,
            track3,
        } => msr.set_bpc(track1, track2, track3)?,
        Action::LeadingZero { track13, track2 } => match (track13, track2) {
            (Some(track13), Some(track2)) => msr.set_leading_zero(track13, track2)?,
            (None, None) => {
                let (track13, track2) = msr.check_leading_zero()?;
                println!("Tracks 1/3: {track13}, track 2: {track2}");
            }
            _ => {
                return Err(MsrToolError::InvalidSetting(
                    "give leading zeros for both tracks 1/3 and track 2".to_string(),
                ))
            }
        },
        Action::Led { state } => msr.set_led(state)?,
    }

    Ok(())
}
