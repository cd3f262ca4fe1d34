use crate::command::{Command, ESC};
use crate::config::{bpi_selector, Coercivity, DeviceConfig, Density};
use crate::frame::{encode_raw_block, FrameCodec};
use crate::iso_mode::{IsoPath, NativeIso, SoftIso};
use crate::msr_tool_error::MsrToolError;
use crate::raw_tracks_data::RawTracksData;
use crate::track::{Track, TRACKS};
use crate::track_status::TrackStatus;
use crate::tracks_data::TracksData;
use crate::transport::Transport;
use log::debug;
use std::fmt;

/// What the session is doing. Every operation starts and ends in `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingSelfTest,
    Reading,
    Writing,
    ConfigurationPending,
    /// A reply went missing or did not match; only a reset is accepted.
    Desynchronized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfTest {
    Communication,
    Ram,
    Sensor,
}

impl SelfTest {
    fn command(self) -> Command {
        match self {
            SelfTest::Communication => Command::CommunicationTest,
            SelfTest::Ram => Command::RamTest,
            SelfTest::Sensor => Command::SensorTest,
        }
    }

    fn expected_reply(self) -> [u8; 2] {
        match self {
            SelfTest::Communication => [ESC, 0x79],
            SelfTest::Ram | SelfTest::Sensor => [ESC, TrackStatus::Ok.byte()],
        }
    }
}

impl fmt::Display for SelfTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelfTest::Communication => f.write_str("communication"),
            SelfTest::Ram => f.write_str("RAM"),
            SelfTest::Sensor => f.write_str("sensor"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    AllOff,
    AllOn,
    Green,
    Yellow,
    Red,
}

impl Led {
    fn command(self) -> Command {
        match self {
            Led::AllOff => Command::TurnLedAllOff,
            Led::AllOn => Command::TurnLedAllOn,
            Led::Green => Command::TurnLedGreenOn,
            Led::Yellow => Command::TurnLedYellowOn,
            Led::Red => Command::TurnLedRedOn,
        }
    }
}

impl std::str::FromStr for Led {
    type Err = MsrToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "off" => Ok(Led::AllOff),
            "on" => Ok(Led::AllOn),
            "green" => Ok(Led::Green),
            "yellow" => Ok(Led::Yellow),
            "red" => Ok(Led::Red),
            _ => Err(MsrToolError::InvalidSetting(format!("led {s}"))),
        }
    }
}

/// A reader/writer on an open transport. One command is in flight at a time; wrap the
/// device in a mutex to share it.
pub struct MsrDevice<T: Transport> {
    frame: FrameCodec<T>,
    config: DeviceConfig,
    state: SessionState,
}

impl<T: Transport> MsrDevice<T> {
    /// Wraps an already open transport. Nothing is sent until the first operation.
    pub fn new(transport: T) -> MsrDevice<T> {
        MsrDevice::with_config(transport, DeviceConfig::default())
    }

    /// `config` must describe what the device currently holds.
    pub fn with_config(transport: T, config: DeviceConfig) -> MsrDevice<T> {
        MsrDevice {
            frame: FrameCodec::new(transport),
            config,
            state: SessionState::Idle,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn into_transport(self) -> T {
        self.frame.into_inner()
    }

    fn run<R>(
        &mut self,
        state: SessionState,
        operation: impl FnOnce(&mut FrameCodec<T>, &mut DeviceConfig) -> Result<R, MsrToolError>,
    ) -> Result<R, MsrToolError> {
        if self.state == SessionState::Desynchronized {
            return Err(MsrToolError::Desynchronized);
        }

        self.state = state;
        let result = operation(&mut self.frame, &mut self.config);
        self.state = match &result {
            Err(e) if e.is_session_disrupting() => {
                debug!("{state:?} failed, session needs a reset: {e}");
                SessionState::Desynchronized
            }
            _ => SessionState::Idle,
        };
        result
    }

    /// Resets the device. Accepted in any state; the device sends no reply.
    pub fn reset(&mut self) -> Result<(), MsrToolError> {
        debug!("Reset device");
        match self.frame.send_command(Command::Reset, &[]) {
            Ok(()) => {
                self.state = SessionState::Idle;
                Ok(())
            }
            Err(e) => {
                self.state = SessionState::Desynchronized;
                Err(e)
            }
        }
    }

    /// Reset, the three self-tests, reset.
    pub fn initialize(&mut self) -> Result<(), MsrToolError> {
        self.reset()?;
        self.run_self_tests()?;
        self.reset()
    }

    pub fn self_test(&mut self, test: SelfTest) -> Result<(), MsrToolError> {
        debug!("Run {test} test");
        self.run(SessionState::AwaitingSelfTest, |frame, _| {
            frame.send_command(test.command(), &[])?;
            let expected = test.expected_reply();
            if frame.read_reply(expected.len())? != expected {
                return Err(MsrToolError::SelfTestFailed(test));
            }
            Ok(())
        })
    }

    pub fn run_self_tests(&mut self) -> Result<(), MsrToolError> {
        for test in [SelfTest::Communication, SelfTest::Ram, SelfTest::Sensor] {
            self.self_test(test)?;
        }
        Ok(())
    }

    pub fn communication_test(&mut self) -> Result<(), MsrToolError> {
        self.self_test(SelfTest::Communication)
    }

    pub fn ram_test(&mut self) -> Result<(), MsrToolError> {
        self.self_test(SelfTest::Ram)
    }

    pub fn sensor_test(&mut self) -> Result<(), MsrToolError> {
        self.self_test(SelfTest::Sensor)
    }

    pub fn set_led(&mut self, led: Led) -> Result<(), MsrToolError> {
        self.run(SessionState::ConfigurationPending, |frame, _| {
            frame.send_command(led.command(), &[])
        })
    }

    pub fn get_device_model(&mut self) -> Result<char, MsrToolError> {
        self.run(SessionState::Reading, |frame, _| {
            frame.send_command(Command::GetDeviceModel, &[])?;
            frame.expect(&[ESC])?;
            let model = frame.read_byte()?;
            frame.expect(b"S")?;
            Ok(model as char)
        })
    }

    pub fn get_firmware_version(&mut self) -> Result<String, MsrToolError> {
        self.run(SessionState::Reading, |frame, _| {
            frame.send_command(Command::GetFirmwareVersion, &[])?;
            frame.expect(&[ESC])?;
            let firmware = frame.read_exact(8)?;
            String::from_utf8(firmware)
                .map_err(|e| MsrToolError::InvalidFirmwareVersion(e.into_bytes()))
        })
    }

    /// Waits for a swipe and returns the bytes of each track as recorded.
    pub fn read_tracks_raw(&mut self) -> Result<RawTracksData, MsrToolError> {
        debug!("Read card, raw");
        self.run(SessionState::Reading, |frame, _| {
            frame.send_command(Command::ReadRaw, &[])?;
            frame.read_raw_block()
        })
    }

    /// Waits for a swipe and writes the bytes of each track as given.
    pub fn write_tracks_raw(&mut self, tracks: &RawTracksData) -> Result<(), MsrToolError> {
        debug!("Write card, raw");
        let block = encode_raw_block(tracks)?;
        self.run(SessionState::Writing, |frame, _| {
            frame.send_command(Command::WriteRaw, &block)?;
            frame.read_status()?;
            Ok(())
        })
    }

    /// Waits for a swipe and returns the track text without sentinels. `soft` decodes a
    /// raw read here instead of relying on the device's ISO decoder.
    pub fn read_tracks_iso(&mut self, soft: bool) -> Result<TracksData, MsrToolError> {
        debug!("Read card, iso (soft: {soft})");
        let path = iso_path::<T>(soft);
        self.run(SessionState::Reading, |frame, config| {
            path.read_tracks(frame, config)
        })
    }

    /// Waits for a swipe and writes the track text. Sentinels are optional. Every track is
    /// checked against its alphabet before anything is sent.
    pub fn write_tracks_iso(&mut self, tracks: &TracksData, soft: bool) -> Result<(), MsrToolError> {
        debug!("Write card, iso (soft: {soft})");
        let tracks = tracks.strip_sentinels();
        tracks.validate()?;
        let path = iso_path::<T>(soft);
        self.run(SessionState::Writing, |frame, config| {
            path.write_tracks(frame, config, &tracks)
        })
    }

    /// Waits for a swipe and erases the selected tracks.
    pub fn erase(&mut self, track1: bool, track2: bool, track3: bool) -> Result<(), MsrToolError> {
        let flags = u8::from(track1) | u8::from(track2) << 1 | u8::from(track3) << 2;
        debug!("Erase card, tracks {flags:#05b}");
        self.run(SessionState::Writing, |frame, _| {
            frame.send_command(Command::Erase, &[flags])?;
            frame.read_status()?;
            Ok(())
        })
    }

    pub fn select_bpi(
        &mut self,
        track1: Density,
        track2: Density,
        track3: Density,
    ) -> Result<(), MsrToolError> {
        self.run(SessionState::ConfigurationPending, |frame, config| {
            for (track, density) in TRACKS.into_iter().zip([track1, track2, track3]) {
                select_track_bpi(frame, config, track, density)?;
            }
            Ok(())
        })
    }

    pub fn set_bpc(&mut self, track1: u8, track2: u8, track3: u8) -> Result<(), MsrToolError> {
        self.run(SessionState::ConfigurationPending, |frame, config| {
            set_track_bpc(frame, config, [track1, track2, track3])
        })
    }

    pub fn set_leading_zero(&mut self, track13: u8, track2: u8) -> Result<(), MsrToolError> {
        self.run(SessionState::ConfigurationPending, |frame, config| {
            set_leading_zeros(frame, config, track13, track2)
        })
    }

    /// Leading zeros the device currently uses for tracks 1/3 and track 2.
    pub fn check_leading_zero(&mut self) -> Result<(u8, u8), MsrToolError> {
        self.run(SessionState::Reading, |frame, config| {
            frame.send_command(Command::CheckLeadingZeros, &[])?;
            frame.expect(&[ESC])?;
            let track13 = frame.read_byte()?;
            let track2 = frame.read_byte()?;
            config.leading_zero13 = track13;
            config.leading_zero2 = track2;
            Ok((track13, track2))
        })
    }

    pub fn set_coercivity(&mut self, coercivity: Coercivity) -> Result<(), MsrToolError> {
        let command = match coercivity {
            Coercivity::High => Command::SetHiCo,
            Coercivity::Low => Command::SetLoCo,
        };
        self.run(SessionState::ConfigurationPending, |frame, config| {
            frame.send_command(command, &[])?;
            frame.read_status()?;
            config.coercivity = coercivity;
            Ok(())
        })
    }

    pub fn set_hi_coercivity(&mut self) -> Result<(), MsrToolError> {
        self.set_coercivity(Coercivity::High)
    }

    pub fn set_lo_coercivity(&mut self) -> Result<(), MsrToolError> {
        self.set_coercivity(Coercivity::Low)
    }

    pub fn get_coercivity(&mut self) -> Result<Coercivity, MsrToolError> {
        self.run(SessionState::Reading, |frame, config| {
            frame.send_command(Command::GetCoercivity, &[])?;
            frame.expect(&[ESC])?;
            let coercivity = match frame.read_byte()? {
                b'H' | b'h' => Coercivity::High,
                b'L' | b'l' => Coercivity::Low,
                other => return Err(MsrToolError::UnexpectedReply(other)),
            };
            config.coercivity = coercivity;
            Ok(coercivity)
        })
    }
}

fn iso_path<'a, T: Transport + 'a>(soft: bool) -> &'a dyn IsoPath<T> {
    if soft {
        &SoftIso
    } else {
        &NativeIso
    }
}

fn select_track_bpi<T: Transport>(
    frame: &mut FrameCodec<T>,
    config: &mut DeviceConfig,
    track: Track,
    density: Density,
) -> Result<(), MsrToolError> {
    debug!("Set {track} to {} bpi", density.bpi());
    frame.send_command(Command::SelectBpi, &[bpi_selector(track, density)])?;
    frame.read_status()?;
    config.track_mut(track).density = density;
    Ok(())
}

fn set_track_bpc<T: Transport>(
    frame: &mut FrameCodec<T>,
    config: &mut DeviceConfig,
    bpc: [u8; 3],
) -> Result<(), MsrToolError> {
    frame.send_command(Command::SetBpc, &bpc)?;
    // an accepted setting is echoed after the status
    frame.read_status()?;
    frame.expect(&bpc)?;
    for (track, bits) in TRACKS.into_iter().zip(bpc) {
        config.track_mut(track).bpc = bits;
    }
    Ok(())
}

fn set_leading_zeros<T: Transport>(
    frame: &mut FrameCodec<T>,
    config: &mut DeviceConfig,
    track13: u8,
    track2: u8,
) -> Result<(), MsrToolError> {
    frame.send_command(Command::SetLeadingZeros, &[track13, track2])?;
    frame.read_status()?;
    config.leading_zero13 = track13;
    config.leading_zero2 = track2;
    Ok(())
}

/// Puts the device in the mode software ISO coding expects: the configured densities and
/// leading zeros, with one bit per alphabet data bit plus parity.
pub(crate) fn apply_iso_mode<T: Transport>(
    frame: &mut FrameCodec<T>,
    config: &mut DeviceConfig,
) -> Result<(), MsrToolError> {
    for track in TRACKS {
        let density = config.track(track).density;
        select_track_bpi(frame, config, track, density)?;
    }
    let bpc = TRACKS.map(|track| track.alphabet().unit_bits());
    set_track_bpc(frame, config, bpc)?;
    let (track13, track2) = (config.leading_zero13, config.leading_zero2);
    set_leading_zeros(frame, config, track13, track2)
}
