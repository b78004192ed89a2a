//! Persisted calibration, packed into a CRC protected byte image.
//!
//! The configuration collaborator stores the image as an opaque blob. The
//! newest valid image wins when loading.

use crc::{Crc, CRC_16_USB};

use crate::calibration::CalibrationBounds;
use crate::switch_position::Thresholds;

/// All the state the probing core persists.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Save {
    pub bounds: CalibrationBounds,
    pub thresholds: Thresholds,
}

impl Save {
    const SIZE: usize = 12;

    fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.bounds.probe_min.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.bounds.probe_max.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.thresholds.low_ma.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.thresholds.high_ma.to_le_bytes());
        bytes
    }

    fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self {
            bounds: CalibrationBounds {
                probe_min: u16::from_le_bytes([bytes[0], bytes[1]]),
                probe_max: u16::from_le_bytes([bytes[2], bytes[3]]),
            },
            thresholds: Thresholds {
                low_ma: f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
                high_ma: f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            },
        }
    }
}

// This constant is used to invalidate data when needed
const TOKEN: u16 = 1;
const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_USB);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidData;

#[derive(Debug, Clone, Copy)]
pub struct Store {
    version: u32,
    token: u16,
    save_raw: [u8; Save::SIZE],
    crc: u16,
}

impl Store {
    pub const SIZE: usize = 4 + 2 + Save::SIZE + 2;

    #[must_use]
    pub fn new(save: Save, version: u32) -> Self {
        let save_raw = save.to_bytes();
        let crc = CRC.checksum(&save_raw);
        Self {
            version,
            token: TOKEN,
            save_raw,
            crc,
        }
    }

    /// # Errors
    ///
    /// This fails with `InvalidData` when recovered save does not pass CRC
    /// check or belongs to an incompatible layout.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Result<Self, InvalidData> {
        let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let token = u16::from_le_bytes([bytes[4], bytes[5]]);
        let mut save_raw = [0; Save::SIZE];
        save_raw.copy_from_slice(&bytes[6..6 + Save::SIZE]);
        let crc = u16::from_le_bytes([bytes[Self::SIZE - 2], bytes[Self::SIZE - 1]]);

        if token != TOKEN || CRC.checksum(&save_raw) != crc {
            return Err(InvalidData);
        }

        Ok(Self {
            version,
            token,
            save_raw,
            crc,
        })
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let mut bytes = [0; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.token.to_le_bytes());
        bytes[6..6 + Save::SIZE].copy_from_slice(&self.save_raw);
        bytes[Self::SIZE - 2..].copy_from_slice(&self.crc.to_le_bytes());
        bytes
    }

    #[must_use]
    pub fn save(&self) -> Save {
        Save::from_bytes(self.save_raw)
    }

    #[must_use]
    pub fn version(&self) -> u32 {
        self.version
    }
}

/// Pick the newest valid store out of raw images.
pub fn latest<'a>(images: impl IntoIterator<Item = &'a [u8; Store::SIZE]>) -> Option<Store> {
    images
        .into_iter()
        .filter_map(|image| Store::from_bytes(*image).ok())
        .max_by_key(Store::version)
}
