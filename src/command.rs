/// Escape byte, starts every command, status and track marker.
pub const ESC: u8 = 0x1b;
/// Field separator, closes a track data block.
pub const FS: u8 = 0x1c;
/// `s`, follows ESC at the start of a track data block.
pub const BLOCK_START: u8 = 0x73;
/// `?`, precedes FS at the end of a track data block.
pub const BLOCK_END: u8 = 0x3f;

/// Device opcodes. The discriminant is the byte sent after ESC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    Reset = 0x61,
    SelectBpi = 0x62,
    Erase = 0x63,
    GetCoercivity = 0x64,
    CommunicationTest = 0x65,
    CheckLeadingZeros = 0x6c,
    ReadRaw = 0x6d,
    WriteRaw = 0x6e,
    SetBpc = 0x6f,
    ReadIso = 0x72,
    GetDeviceModel = 0x74,
    GetFirmwareVersion = 0x76,
    WriteIso = 0x77,
    SetHiCo = 0x78,
    SetLoCo = 0x79,
    SetLeadingZeros = 0x7a,
    TurnLedAllOff = 0x81,
    TurnLedAllOn = 0x82,
    TurnLedGreenOn = 0x83,
    TurnLedYellowOn = 0x84,
    TurnLedRedOn = 0x85,
    SensorTest = 0x86,
    RamTest = 0x87,
}

const COMMANDS: [Command; 23] = [
    Command::Reset,
    Command::SelectBpi,
    Command::Erase,
    Command::GetCoercivity,
    Command::CommunicationTest,
    Command::CheckLeadingZeros,
    Command::ReadRaw,
    Command::WriteRaw,
    Command::SetBpc,
    Command::ReadIso,
    Command::GetDeviceModel,
    Command::GetFirmwareVersion,
    Command::WriteIso,
    Command::SetHiCo,
    Command::SetLoCo,
    Command::SetLeadingZeros,
    Command::TurnLedAllOff,
    Command::TurnLedAllOn,
    Command::TurnLedGreenOn,
    Command::TurnLedYellowOn,
    Command::TurnLedRedOn,
    Command::SensorTest,
    Command::RamTest,
];

impl Command {
    pub fn opcode(self) -> u8 {
        self as u8
    }

    pub fn from_opcode(opcode: u8) -> Option<Command> {
        COMMANDS
            .iter()
            .copied()
            .find(|command| command.opcode() == opcode)
    }

    pub fn packets(&self) -> Vec<u8> {
        vec![ESC, self.opcode()]
    }

    pub fn with_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut packets = self.packets();
        packets.extend_from_slice(payload);
        packets
    }
}
