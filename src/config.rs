use crate::msr_tool_error::MsrToolError;
use crate::track::Track;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercivity {
    High,
    Low,
}

impl FromStr for Coercivity {
    type Err = MsrToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hi" | "high" => Ok(Coercivity::High),
            "lo" | "low" => Ok(Coercivity::Low),
            _ => Err(MsrToolError::InvalidSetting(format!("coercivity {s}"))),
        }
    }
}

/// Recording density of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Density {
    /// 75 bits per inch
    Low,
    /// 210 bits per inch
    High,
}

impl Density {
    pub fn bpi(self) -> u16 {
        match self {
            Density::Low => 75,
            Density::High => 210,
        }
    }
}

impl From<bool> for Density {
    fn from(high: bool) -> Self {
        if high {
            Density::High
        } else {
            Density::Low
        }
    }
}

impl FromStr for Density {
    type Err = MsrToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "75" => Ok(Density::Low),
            "210" => Ok(Density::High),
            _ => Err(MsrToolError::InvalidSetting(format!("{s} bpi"))),
        }
    }
}

/// Select-BPI argument bytes per track, (75 bpi, 210 bpi).
const BPI_SELECTORS: [(u8, u8); 3] = [(0xa0, 0xa1), (0x4b, 0xd2), (0xc0, 0xc1)];

pub fn bpi_selector(track: Track, density: Density) -> u8 {
    let (low, high) = BPI_SELECTORS[track.index()];
    match density {
        Density::Low => low,
        Density::High => high,
    }
}

/// How software-encoded ISO units are laid out in a raw write block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RawWriteLayout {
    /// Every unit mirrored across the whole byte.
    #[default]
    ByteReversed,
    /// The layout a raw read returns: each unit mirrored across its own width.
    AsRead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackConfig {
    pub bpc: u8,
    pub density: Density,
}

impl TrackConfig {
    pub fn bpi(&self) -> u16 {
        self.density.bpi()
    }
}

/// Session-side mirror of the settings held in device memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub track1: TrackConfig,
    pub track2: TrackConfig,
    pub track3: TrackConfig,
    pub leading_zero13: u8,
    pub leading_zero2: u8,
    pub coercivity: Coercivity,
    pub raw_write_layout: RawWriteLayout,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        DeviceConfig::iso()
    }
}

impl DeviceConfig {
    /// ISO 7811 settings: 7/5/5 bits per character at 210/75/210 bpi.
    pub fn iso() -> DeviceConfig {
        DeviceConfig {
            track1: TrackConfig {
                bpc: 7,
                density: Density::High,
            },
            track2: TrackConfig {
                bpc: 5,
                density: Density::Low,
            },
            track3: TrackConfig {
                bpc: 5,
                density: Density::High,
            },
            leading_zero13: 61,
            leading_zero2: 22,
            coercivity: Coercivity::High,
            raw_write_layout: RawWriteLayout::default(),
        }
    }

    pub fn track(&self, track: Track) -> &TrackConfig {
        match track {
            Track::One => &self.track1,
            Track::Two => &self.track2,
            Track::Three => &self.track3,
        }
    }

    pub fn track_mut(&mut self, track: Track) -> &mut TrackConfig {
        match track {
            Track::One => &mut self.track1,
            Track::Two => &mut self.track2,
            Track::Three => &mut self.track3,
        }
    }

    pub fn bpc_packets(&self) -> Vec<u8> {
        vec![self.track1.bpc, self.track2.bpc, self.track3.bpc]
    }

    pub fn leading_zero_packets(&self) -> Vec<u8> {
        vec![self.leading_zero13, self.leading_zero2]
    }
}
