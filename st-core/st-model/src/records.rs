//! Domain record elements.
//!
//! Besides primitives, a few multi-field records travel over the link as
//! single elements: the connected Bluetooth source and the audio analysis
//! frames produced by the sound processor. Their canonical string form is
//! comma-joined fields, which keeps them usable in validation allow-lists
//! and NVM preferences like any other element.

extern crate alloc;

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::value::{DataType, DataValue, TEXT_VALUE_BYTES, TextValue};

/// A Bluetooth audio source as seen by the A2DP side.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BtDeviceInfo {
    /// Advertised device name.
    pub name: TextValue,
    /// 48-bit device address.
    pub address: [u8; 6],
    /// Last observed signal strength, dBm.
    pub rssi: i8,
}

impl BtDeviceInfo {
    pub fn new(name: &str, address: [u8; 6], rssi: i8) -> Self {
        Self {
            name: TextValue::new(name),
            address,
            rssi,
        }
    }

    fn address_string(&self) -> String {
        let a = &self.address;
        format!(
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }

    fn parse_address(s: &str) -> Option<[u8; 6]> {
        let mut out = [0u8; 6];
        let mut parts = s.split(':');
        for slot in out.iter_mut() {
            *slot = u8::from_str_radix(parts.next()?, 16).ok()?;
        }
        if parts.next().is_some() { None } else { Some(out) }
    }
}

impl DataValue for BtDeviceInfo {
    const DATA_TYPE: DataType = DataType::BtDeviceInfo;

    fn to_bytes(&self, out: &mut Vec<u8>) {
        self.name.to_bytes(out);
        out.extend_from_slice(&self.address);
        out.extend_from_slice(&self.rssi.to_le_bytes());
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::DATA_TYPE.byte_size() {
            return None;
        }
        let name = TextValue::from_bytes(&bytes[..TEXT_VALUE_BYTES])?;
        let mut address = [0u8; 6];
        address.copy_from_slice(&bytes[TEXT_VALUE_BYTES..TEXT_VALUE_BYTES + 6]);
        let rssi = bytes[TEXT_VALUE_BYTES + 6] as i8;
        Some(Self {
            name,
            address,
            rssi,
        })
    }

    fn to_canonical(&self) -> String {
        format!(
            "{},{},{}",
            self.name.as_str(),
            self.address_string(),
            self.rssi
        )
    }

    fn from_canonical(s: &str) -> Option<Self> {
        // The name may itself contain commas; address and RSSI cannot.
        let mut tail = s.rsplitn(3, ',');
        let rssi = tail.next()?.trim().parse().ok()?;
        let address = Self::parse_address(tail.next()?.trim())?;
        let name = tail.next()?;
        Some(Self {
            name: TextValue::new(name),
            address,
            rssi,
        })
    }
}

/// One processed audio frame: overall signal statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessedSoundFrame {
    /// Signal power normalized to `0.0..=1.0`.
    pub normalized_power: f32,
    /// Minimum raw sample in the frame.
    pub minimum: i32,
    /// Maximum raw sample in the frame.
    pub maximum: i32,
}

impl DataValue for ProcessedSoundFrame {
    const DATA_TYPE: DataType = DataType::SoundFrame;

    fn to_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.normalized_power.to_le_bytes());
        out.extend_from_slice(&self.minimum.to_le_bytes());
        out.extend_from_slice(&self.maximum.to_le_bytes());
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::DATA_TYPE.byte_size() {
            return None;
        }
        Some(Self {
            normalized_power: f32::from_le_bytes(bytes[0..4].try_into().ok()?),
            minimum: i32::from_le_bytes(bytes[4..8].try_into().ok()?),
            maximum: i32::from_le_bytes(bytes[8..12].try_into().ok()?),
        })
    }

    fn to_canonical(&self) -> String {
        format!("{},{},{}", self.normalized_power, self.minimum, self.maximum)
    }

    fn from_canonical(s: &str) -> Option<Self> {
        let mut parts = s.split(',');
        let normalized_power = parts.next()?.trim().parse().ok()?;
        let minimum = parts.next()?.trim().parse().ok()?;
        let maximum = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            normalized_power,
            minimum,
            maximum,
        })
    }
}

/// The dominant frequency band of one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MaxBandFrame {
    /// Power of the dominant band, normalized to `0.0..=1.0`.
    pub normalized_power: f32,
    /// Index of the dominant band.
    pub band_index: u16,
    /// Number of bands in the analysis.
    pub total_bands: u16,
}

impl DataValue for MaxBandFrame {
    const DATA_TYPE: DataType = DataType::MaxBandFrame;

    fn to_bytes(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.normalized_power.to_le_bytes());
        out.extend_from_slice(&self.band_index.to_le_bytes());
        out.extend_from_slice(&self.total_bands.to_le_bytes());
    }

    fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::DATA_TYPE.byte_size() {
            return None;
        }
        Some(Self {
            normalized_power: f32::from_le_bytes(bytes[0..4].try_into().ok()?),
            band_index: u16::from_le_bytes(bytes[4..6].try_into().ok()?),
            total_bands: u16::from_le_bytes(bytes[6..8].try_into().ok()?),
        })
    }

    fn to_canonical(&self) -> String {
        format!("{},{},{}", self.normalized_power, self.band_index, self.total_bands)
    }

    fn from_canonical(s: &str) -> Option<Self> {
        let mut parts = s.split(',');
        let normalized_power = parts.next()?.trim().parse().ok()?;
        let band_index = parts.next()?.trim().parse().ok()?;
        let total_bands = parts.next()?.trim().parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            normalized_power,
            band_index,
            total_bands,
        })
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_bt_device_round_trip() {
        let dev = BtDeviceInfo::new("Living Room", [0xAA, 0xBB, 0xCC, 0x01, 0x02, 0x03], -52);

        let mut bytes = Vec::new();
        dev.to_bytes(&mut bytes);
        assert_eq!(bytes.len(), DataType::BtDeviceInfo.byte_size());
        assert_eq!(BtDeviceInfo::from_bytes(&bytes), Some(dev.clone()));

        let canonical = dev.to_canonical();
        assert_eq!(BtDeviceInfo::from_canonical(&canonical), Some(dev));
    }

    #[test]
    fn test_bt_device_name_with_comma() {
        let dev = BtDeviceInfo::new("Kitchen, upstairs", [1, 2, 3, 4, 5, 6], -70);
        let canonical = dev.to_canonical();
        assert_eq!(BtDeviceInfo::from_canonical(&canonical), Some(dev));
    }

    #[test]
    fn test_bt_device_rejects_bad_address() {
        assert_eq!(BtDeviceInfo::from_canonical("name,AA:BB:CC,-10"), None);
        assert_eq!(BtDeviceInfo::from_canonical("name,AA:BB:CC:DD:EE:ZZ,-10"), None);
    }

    #[test]
    fn test_sound_frame_round_trip() {
        let frame = ProcessedSoundFrame {
            normalized_power: 0.75,
            minimum: -1024,
            maximum: 2048,
        };

        let mut bytes = Vec::new();
        frame.to_bytes(&mut bytes);
        assert_eq!(bytes.len(), DataType::SoundFrame.byte_size());
        assert_eq!(ProcessedSoundFrame::from_bytes(&bytes), Some(frame));
        assert_eq!(
            ProcessedSoundFrame::from_canonical(&frame.to_canonical()),
            Some(frame)
        );
    }

    #[test]
    fn test_max_band_round_trip() {
        let frame = MaxBandFrame {
            normalized_power: 0.5,
            band_index: 3,
            total_bands: 8,
        };

        let mut bytes = Vec::new();
        frame.to_bytes(&mut bytes);
        assert_eq!(bytes.len(), DataType::MaxBandFrame.byte_size());
        assert_eq!(MaxBandFrame::from_bytes(&bytes), Some(frame));
        assert_eq!(MaxBandFrame::from_canonical(&frame.to_canonical()), Some(frame));
    }
}
