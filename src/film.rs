/**
 * Film and frame records recovered from the data-logger export
 */

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::modes::{AfMode, Aperture, FilmAdvanceMode, FlashMode, MeteringMode, MultipleExposure, ShootingMode};

/// One roll loaded into one camera body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: i64,
    pub camera_id: i64,
    pub title: Option<String>,
    pub film_loaded_timestamp: Option<DateTime<FixedOffset>>,
    /// Declared roll capacity
    pub frame_count: Option<i64>,
    /// Box speed, used for frames that did not record their own ISO
    pub iso: Option<i64>,
    pub remarks: Option<String>,
    pub frames: Vec<Frame>,
}

impl Film {
    pub fn new(camera_id: i64, id: i64) -> Self {
        Self {
            id,
            camera_id,
            title: None,
            film_loaded_timestamp: None,
            frame_count: None,
            iso: None,
            remarks: None,
            frames: Vec::new(),
        }
    }
}

/// One exposure on a roll.
///
/// Only `number` is guaranteed; everything else may be missing when the
/// logger did not record it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// Camera-side "select" marker
    pub flag: bool,
    pub number: i64,
    pub focal_length: Option<i64>,
    pub max_aperture: Option<Aperture>,
    /// Shutter speed exactly as exported, e.g. `1/250` or `2"5`
    pub tv: Option<String>,
    pub av: Option<Aperture>,
    /// ISO recorded for this frame; see [`Frame::effective_iso`]
    pub iso: Option<i64>,
    pub exposure_compensation: Option<f64>,
    pub flash_compensation: Option<f64>,
    pub flash_mode: Option<FlashMode>,
    pub metering_mode: Option<MeteringMode>,
    pub shooting_mode: Option<ShootingMode>,
    pub film_advance_mode: Option<FilmAdvanceMode>,
    pub af_mode: Option<AfMode>,
    pub bulb_exposure_time: Option<String>,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub multiple_exposure: Option<MultipleExposure>,
    pub battery_loaded_date: Option<DateTime<FixedOffset>>,
    pub remarks: Option<String>,
}

impl Frame {
    pub fn new(number: i64) -> Self {
        Self {
            flag: false,
            number,
            focal_length: None,
            max_aperture: None,
            tv: None,
            av: None,
            iso: None,
            exposure_compensation: None,
            flash_compensation: None,
            flash_mode: None,
            metering_mode: None,
            shooting_mode: None,
            film_advance_mode: None,
            af_mode: None,
            bulb_exposure_time: None,
            timestamp: None,
            multiple_exposure: None,
            battery_loaded_date: None,
            remarks: None,
        }
    }

    /// ISO to tag the frame with: its own reading, else the film's box speed
    pub fn effective_iso(&self, film_iso: Option<i64>) -> Option<i64> {
        self.iso.or(film_iso)
    }
}
