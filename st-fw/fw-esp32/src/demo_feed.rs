//! Synthetic analysis frames for bench boards.
//!
//! With the `demo_feed` feature enabled the engine loop calls [`feed`]
//! every tick, sweeping plausible band levels so a board on the desk
//! produces link traffic without the sound pipeline attached.

use st_model::{MaxBandFrame, ProcessedSoundFrame};

use crate::values::TowerValues;

pub fn feed(values: &TowerValues, now_ms: u64) {
    // Triangle sweep, one full cycle per 2.048 s.
    let phase = (now_ms % 2048) as f32 / 2048.0;
    let sweep = if phase < 0.5 { phase * 2.0 } else { (1.0 - phase) * 2.0 };

    let mut bands = [0.0f32; 8];
    for (i, band) in bands.iter_mut().enumerate() {
        let offset = i as f32 / 8.0;
        let p = (phase + offset) % 1.0;
        *band = if p < 0.5 { p * 2.0 } else { (1.0 - p) * 2.0 };
    }
    values.band_levels.borrow_mut().set_value(&bands);

    let mut max_index = 0u16;
    for (i, band) in bands.iter().enumerate() {
        if *band > bands[max_index as usize] {
            max_index = i as u16;
        }
    }
    values.max_band.borrow_mut().set_value(&[MaxBandFrame {
        normalized_power: bands[max_index as usize],
        band_index: max_index,
        total_bands: 8,
    }]);

    values.sound_state.borrow_mut().set_value(&[ProcessedSoundFrame {
        normalized_power: sweep,
        minimum: -(sweep * 32768.0) as i32,
        maximum: (sweep * 32767.0) as i32,
    }]);
}
