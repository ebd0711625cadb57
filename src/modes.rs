/**
 * Camera setting values recorded per frame
 *
 * Each enumeration accepts only the exact spellings the data logger exports
 * and knows which EXIF / Canon maker-note tags it expands to.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// Expansion of one domain value into the tags downstream tools read.
///
/// Pairs are `(tag name, tag value)` in a stable order.
pub trait ExifValue {
    fn exif_value(&self) -> Vec<(&'static str, String)>;
}

closed_set! {
    /// Flash mode as recorded by the camera
    pub enum FlashMode ("FlashMode") {
        On => "ON",
        Off => "OFF",
        ETtl => "E-TTL",
        ATtl => "A-TTL",
        TtlAutoflash => "TTL autoflash",
        ManualFlash => "Manual flash",
    }
}

impl FlashMode {
    fn exif_flash(&self) -> &'static str {
        match self {
            FlashMode::Off => "Off, Did not fire",
            FlashMode::On | FlashMode::ManualFlash => "On, Fired",
            FlashMode::ETtl | FlashMode::ATtl | FlashMode::TtlAutoflash => "Auto, Fired",
        }
    }

    fn canon_flash_bits(&self) -> &'static str {
        match self {
            FlashMode::ETtl => "E-TTL",
            FlashMode::ATtl => "A-TTL",
            FlashMode::TtlAutoflash => "TTL",
            FlashMode::ManualFlash => "Manual",
            FlashMode::On | FlashMode::Off => "(none)",
        }
    }

    fn canon_flash_mode(&self) -> &'static str {
        match self {
            FlashMode::Off => "Off",
            FlashMode::TtlAutoflash => "Auto",
            _ => "On",
        }
    }
}

impl ExifValue for FlashMode {
    fn exif_value(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ExifIFD:Flash", self.exif_flash().to_string()),
            ("Canon:FlashBits", self.canon_flash_bits().to_string()),
            ("Canon:CanonFlashMode", self.canon_flash_mode().to_string()),
        ]
    }
}

closed_set! {
    /// Light metering pattern
    pub enum MeteringMode ("MeteringMode") {
        Evaluative => "Evaluative",
        Partial => "Partial",
        Spot => "Spot",
        CenterAveraging => "Center Averaging",
    }
}

impl MeteringMode {
    fn exif_ifd_value(&self) -> &'static str {
        match self {
            MeteringMode::Evaluative => "Multi-Segment",
            MeteringMode::Partial => "Partial",
            MeteringMode::Spot => "Spot",
            MeteringMode::CenterAveraging => "Center-weighted average",
        }
    }
}

impl ExifValue for MeteringMode {
    fn exif_value(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ExifIFD:MeteringMode", self.exif_ifd_value().to_string()),
            ("Canon:MeteringMode", self.as_str().to_string()),
            ("CanonCustom:PF2DisableMeteringModes", "Off".to_string()),
        ]
    }
}

closed_set! {
    /// Exposure program dial position
    pub enum ShootingMode ("ShootingMode") {
        ProgramAe => "Program AE",
        ShutterSpeedPriorityAe => "Shutter-speed-priority AE",
        AperturePriorityAe => "Aperture-priority AE",
        DepthOfFieldAe => "Depth-of-field AE",
        ManualExposure => "Manual exposure",
        Bulb => "Bulb",
    }
}

impl ShootingMode {
    fn exif_ifd_value(&self) -> &'static str {
        match self {
            ShootingMode::ProgramAe => "Program AE",
            ShootingMode::ShutterSpeedPriorityAe => "Shutter speed priority AE",
            ShootingMode::AperturePriorityAe => "Aperture-priority AE",
            // EXIF has no depth-of-field program
            ShootingMode::DepthOfFieldAe => "Not Defined",
            ShootingMode::ManualExposure => "Manual",
            ShootingMode::Bulb => "Bulb",
        }
    }

    fn canon_value(&self) -> &'static str {
        match self {
            ShootingMode::DepthOfFieldAe => "Depth-of-field AE",
            other => other.exif_ifd_value(),
        }
    }
}

impl ExifValue for ShootingMode {
    fn exif_value(&self) -> Vec<(&'static str, String)> {
        vec![
            ("ExifIFD:ExposureProgram", self.exif_ifd_value().to_string()),
            ("Canon:CanonExposureMode", self.canon_value().to_string()),
            ("CanonCustom:PF1DisableShootingModes", "Off".to_string()),
            ("CanonCustom:PF6PresetShootingModes", "Off".to_string()),
        ]
    }
}

closed_set! {
    /// Drive mode used to advance the film after the exposure
    pub enum FilmAdvanceMode ("FilmAdvanceMode") {
        SingleFrame => "Single-frame",
        ContinuousBodyOnly => "Continuous (body only)",
        LowSpeedContinuous => "Low-speed continuous",
        HighSpeedContinuous => "High-speed continuous",
        UltraHighSpeedContinuous => "Ultra-high-speed continuous",
        SelfTimer2Sec => "2-sec. self-timer",
        SelfTimer10Sec => "10-sec. self-timer",
    }
}

closed_set! {
    /// Autofocus mode
    pub enum AfMode ("AFMode") {
        OneShotAf => "One-Shot AF",
        AiServoAf => "AI Servo AF",
        ManualFocus => "Manual focus",
    }
}

impl ExifValue for AfMode {
    fn exif_value(&self) -> Vec<(&'static str, String)> {
        vec![("Canon:FocusMode", self.as_str().to_string())]
    }
}

closed_set! {
    pub enum MultipleExposure ("MultipleExposure") {
        On => "ON",
        Off => "OFF",
    }
}

closed_set! {
    /// Value for the EXIF `FileSource` tag
    pub enum FileSource ("FileSource") {
        FilmScanner => "Film Scanner",
        ReflectionPrintScanner => "Reflection Print Scanner",
        DigitalCamera => "Digital Camera",
    }
}

/// F-number, e.g. `1.4` or `22`
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Aperture(f64);

impl Aperture {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl FromStr for Aperture {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptyValue);
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Aperture(value)),
            _ => Err(ParseError::MalformedValue {
                field: "aperture",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Aperture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl ExifValue for Aperture {
    fn exif_value(&self) -> Vec<(&'static str, String)> {
        let value = self.to_string();
        vec![
            ("ExifIFD:FNumber", value.clone()),
            ("ExifIFD:ApertureValue", value.clone()),
            ("Canon:FNumber", value.clone()),
            ("Canon:TargetAperture", value),
        ]
    }
}
