//! Identification of physical sense points on the board.
//!
//! Every pad the probe can touch occupies exactly one slot of [`TABLE`]. The
//! slots are ordered by the raw reading the probe yields on them, from the
//! lowest to the highest, so the table doubles as the lookup used by the row
//! decoder.

use core::fmt;
use core::ops::RangeInclusive;

/// Number of equal-width buckets the calibrated reading range is split into.
pub const TABLE_SIZE: usize = 102;

/// Number of breadboard rows.
pub const ROWS: u8 = 60;

/// Slot of `Row(1)`. Rows occupy consecutive slots from here on.
const FIRST_ROW_SLOT: usize = 18;

/// Slots of function pads, the noisiest region of the scale.
pub const FUNCTION_PAD_SLOTS: RangeInclusive<usize> = 8..=15;

/// A single physical pad of the board.
///
/// Absence of a pad is expressed as `Option<PadId>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PadId {
    Row(u8),
    Rail(Rail, Polarity),
    Header(HeaderPad),
    Function(FunctionPad),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rail {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    Positive,
    Negative,
}

/// Pins of the microcontroller header, numbered the same way as they are
/// printed on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HeaderPad {
    D(u8),
    A(u8),
    Gnd(u8),
    Reset(u8),
    V3v3,
    V5,
    Vin,
    Aref,
}

/// Pads outside of the breadboard area.
///
/// The order of variants follows their order in [`TABLE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FunctionPad {
    Adc,
    Dac,
    Gpio,
    Uart,
    LogoTop,
    LogoBottom,
    BuildingTop,
    BuildingBottom,
}

/// Pads ordered by their raw reading. The single source of truth for
/// decoding.
pub const TABLE: [PadId; TABLE_SIZE] = [
    PadId::Header(HeaderPad::Gnd(0)),
    PadId::Header(HeaderPad::Gnd(1)),
    PadId::Header(HeaderPad::Reset(0)),
    PadId::Header(HeaderPad::Reset(1)),
    PadId::Header(HeaderPad::V3v3),
    PadId::Header(HeaderPad::V5),
    PadId::Header(HeaderPad::Vin),
    PadId::Header(HeaderPad::Aref),
    PadId::Function(FunctionPad::Adc),
    PadId::Function(FunctionPad::Dac),
    PadId::Function(FunctionPad::Gpio),
    PadId::Function(FunctionPad::Uart),
    PadId::Function(FunctionPad::LogoTop),
    PadId::Function(FunctionPad::LogoBottom),
    PadId::Function(FunctionPad::BuildingTop),
    PadId::Function(FunctionPad::BuildingBottom),
    PadId::Rail(Rail::Top, Polarity::Positive),
    PadId::Rail(Rail::Top, Polarity::Negative),
    PadId::Row(1),
    PadId::Row(2),
    PadId::Row(3),
    PadId::Row(4),
    PadId::Row(5),
    PadId::Row(6),
    PadId::Row(7),
    PadId::Row(8),
    PadId::Row(9),
    PadId::Row(10),
    PadId::Row(11),
    PadId::Row(12),
    PadId::Row(13),
    PadId::Row(14),
    PadId::Row(15),
    PadId::Row(16),
    PadId::Row(17),
    PadId::Row(18),
    PadId::Row(19),
    PadId::Row(20),
    PadId::Row(21),
    PadId::Row(22),
    PadId::Row(23),
    PadId::Row(24),
    PadId::Row(25),
    PadId::Row(26),
    PadId::Row(27),
    PadId::Row(28),
    PadId::Row(29),
    PadId::Row(30),
    PadId::Row(31),
    PadId::Row(32),
    PadId::Row(33),
    PadId::Row(34),
    PadId::Row(35),
    PadId::Row(36),
    PadId::Row(37),
    PadId::Row(38),
    PadId::Row(39),
    PadId::Row(40),
    PadId::Row(41),
    PadId::Row(42),
    PadId::Row(43),
    PadId::Row(44),
    PadId::Row(45),
    PadId::Row(46),
    PadId::Row(47),
    PadId::Row(48),
    PadId::Row(49),
    PadId::Row(50),
    PadId::Row(51),
    PadId::Row(52),
    PadId::Row(53),
    PadId::Row(54),
    PadId::Row(55),
    PadId::Row(56),
    PadId::Row(57),
    PadId::Row(58),
    PadId::Row(59),
    PadId::Row(60),
    PadId::Rail(Rail::Bottom, Polarity::Positive),
    PadId::Rail(Rail::Bottom, Polarity::Negative),
    PadId::Header(HeaderPad::D(0)),
    PadId::Header(HeaderPad::D(1)),
    PadId::Header(HeaderPad::D(2)),
    PadId::Header(HeaderPad::D(3)),
    PadId::Header(HeaderPad::D(4)),
    PadId::Header(HeaderPad::D(5)),
    PadId::Header(HeaderPad::D(6)),
    PadId::Header(HeaderPad::D(7)),
    PadId::Header(HeaderPad::D(8)),
    PadId::Header(HeaderPad::D(9)),
    PadId::Header(HeaderPad::D(10)),
    PadId::Header(HeaderPad::D(11)),
    PadId::Header(HeaderPad::D(12)),
    PadId::Header(HeaderPad::D(13)),
    PadId::Header(HeaderPad::A(0)),
    PadId::Header(HeaderPad::A(1)),
    PadId::Header(HeaderPad::A(2)),
    PadId::Header(HeaderPad::A(3)),
    PadId::Header(HeaderPad::A(4)),
    PadId::Header(HeaderPad::A(5)),
    PadId::Header(HeaderPad::A(6)),
    PadId::Header(HeaderPad::A(7)),
];

const NAMES: [&str; TABLE_SIZE] = [
    "GND0", "GND1", "RST0", "RST1", "3V3", "5V", "VIN", "AREF", "ADC", "DAC", "GPIO", "UART",
    "LOGO_T", "LOGO_B", "BLDG_T", "BLDG_B", "T+", "T-", "1", "2", "3", "4", "5", "6", "7", "8",
    "9", "10", "11", "12", "13", "14", "15", "16", "17", "18", "19", "20", "21", "22", "23", "24",
    "25", "26", "27", "28", "29", "30", "31", "32", "33", "34", "35", "36", "37", "38", "39", "40",
    "41", "42", "43", "44", "45", "46", "47", "48", "49", "50", "51", "52", "53", "54", "55", "56",
    "57", "58", "59", "60", "B+", "B-", "D0", "D1", "D2", "D3", "D4", "D5", "D6", "D7", "D8", "D9",
    "D10", "D11", "D12", "D13", "A0", "A1", "A2", "A3", "A4", "A5", "A6", "A7",
];

impl PadId {
    /// Pad occupying the given table slot.
    #[must_use]
    pub fn from_slot(slot: usize) -> Option<Self> {
        TABLE.get(slot).copied()
    }

    /// Table slot of the pad, `None` for identifiers not present on the
    /// board, e.g. `Row(0)`.
    #[must_use]
    pub fn slot(self) -> Option<usize> {
        let slot = match self {
            Self::Row(row @ 1..=ROWS) => FIRST_ROW_SLOT + row as usize - 1,
            Self::Rail(Rail::Top, Polarity::Positive) => 16,
            Self::Rail(Rail::Top, Polarity::Negative) => 17,
            Self::Rail(Rail::Bottom, Polarity::Positive) => 78,
            Self::Rail(Rail::Bottom, Polarity::Negative) => 79,
            Self::Header(header) => header_slot(header)?,
            Self::Function(function) => *FUNCTION_PAD_SLOTS.start() + function as usize,
            Self::Row(_) => return None,
        };
        Some(slot)
    }

    /// Human readable name, as printed on the board.
    #[must_use]
    pub fn name(self) -> &'static str {
        self.slot().map_or("?", |slot| NAMES[slot])
    }

    #[must_use]
    pub fn is_function_pad(self) -> bool {
        matches!(self, Self::Function(_))
    }

    #[must_use]
    pub fn is_row(self) -> bool {
        matches!(self, Self::Row(_))
    }
}

fn header_slot(header: HeaderPad) -> Option<usize> {
    let slot = match header {
        HeaderPad::Gnd(i @ 0..=1) => i as usize,
        HeaderPad::Reset(i @ 0..=1) => 2 + i as usize,
        HeaderPad::V3v3 => 4,
        HeaderPad::V5 => 5,
        HeaderPad::Vin => 6,
        HeaderPad::Aref => 7,
        HeaderPad::D(i @ 0..=13) => 80 + i as usize,
        HeaderPad::A(i @ 0..=7) => 94 + i as usize,
        _ => return None,
    };
    Some(slot)
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
