/**
 * Frame-to-tag mapping and exiftool command assembly
 *
 * A frame expands into several tag assignments: the same value usually has to
 * land in the standard EXIF IFD and in the Canon maker-note namespace, or
 * downstream tools only see half of it.
 */

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use std::fmt;

use crate::config::Config;
use crate::film::{Film, Frame};
use crate::modes::{AfMode, Aperture, ExifValue, FileSource, FlashMode, MeteringMode, ShootingMode};
use crate::naming::FilenameGenerator;

/// Flags passed to every generated exiftool invocation
const DEFAULT_OPTIONS: &[&str] = &["-overwrite_original"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Operator {
    /// `-Tag=value`
    Assign,
    /// `-Tag<SourceTag`
    CopyFrom,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Assign => "=",
            Operator::CopyFrom => "<",
        }
    }
}

/// One tag instruction. For `CopyFrom`, `value` names the source tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TagOp {
    pub tag: String,
    pub value: String,
    pub operator: Operator,
}

impl TagOp {
    pub fn assign(tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
            operator: Operator::Assign,
        }
    }

    pub fn copy_from(tag: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            value: source.into(),
            operator: Operator::CopyFrom,
        }
    }
}

impl fmt::Display for TagOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "-{}{}{}", self.tag, self.operator.symbol(), self.value)
    }
}

/// Tag operations for one frame.
///
/// `film_iso` is the box speed of the frame's film and only applies when the
/// frame recorded no ISO of its own. Absent fields contribute nothing.
pub fn map_frame(frame: &Frame, film_iso: Option<i64>) -> Vec<TagOp> {
    let mut et = ExifTool::default();

    if let Some(iso) = frame.effective_iso(film_iso) {
        et.iso(iso);
    }
    if let Some(av) = frame.av {
        et.aperture(av);
    }
    if let Some(tv) = &frame.tv {
        et.exposure(tv);
    }
    if let Some(ec) = frame.exposure_compensation {
        et.exposure_compensation(ec);
    }
    if let Some(fc) = frame.flash_compensation {
        et.flash_compensation(fc);
    }
    if let Some(fl) = frame.focal_length {
        et.focal_length(fl);
    }
    if let Some(mode) = frame.flash_mode {
        et.flash_mode(mode);
    }
    if let Some(mode) = frame.metering_mode {
        et.metering_mode(mode);
    }
    if let Some(mode) = frame.shooting_mode {
        et.shooting_mode(mode);
    }
    if let Some(mode) = frame.af_mode {
        et.focus_mode(mode);
    }
    if let Some(ts) = frame.timestamp {
        et.timestamp(ts);
    }

    et.options
}

/// Builder for a single exiftool invocation on one image file
#[derive(Debug, Clone, Default)]
pub struct ExifTool {
    binary: String,
    filename: String,
    options: Vec<TagOp>,
}

impl ExifTool {
    pub fn new(binary: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            filename: filename.into(),
            options: Vec::new(),
        }
    }

    /// Command pre-filled with every tag the frame carries
    pub fn from_frame(
        binary: impl Into<String>,
        filename: impl Into<String>,
        frame: &Frame,
        film_iso: Option<i64>,
    ) -> Self {
        let mut et = Self::new(binary, filename);
        et.options = map_frame(frame, film_iso);
        et
    }

    pub fn options(&self) -> &[TagOp] {
        &self.options
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn iso(&mut self, iso: i64) -> &mut Self {
        let value = iso.to_string();
        self.add("ISO", value.clone());
        self.add("ISOSpeed", value)
    }

    pub fn aperture(&mut self, av: Aperture) -> &mut Self {
        self.extend(av.exif_value())
    }

    /// Shutter speed, passed through exactly as recorded
    pub fn exposure(&mut self, tv: &str) -> &mut Self {
        self.add("ExposureTime", tv);
        self.add("ShutterSpeedValue", tv)
    }

    pub fn exposure_compensation(&mut self, stops: f64) -> &mut Self {
        self.add("ExposureCompensation", format_decimal(stops))
    }

    pub fn flash_compensation(&mut self, stops: f64) -> &mut Self {
        self.add("FlashExposureComp", format_decimal(stops))
    }

    pub fn focal_length(&mut self, mm: i64) -> &mut Self {
        self.add("FocalLength", format!("{}mm", mm))
    }

    pub fn flash_mode(&mut self, mode: FlashMode) -> &mut Self {
        self.extend(mode.exif_value())
    }

    pub fn metering_mode(&mut self, mode: MeteringMode) -> &mut Self {
        self.extend(mode.exif_value())
    }

    pub fn shooting_mode(&mut self, mode: ShootingMode) -> &mut Self {
        self.extend(mode.exif_value())
    }

    pub fn focus_mode(&mut self, mode: AfMode) -> &mut Self {
        self.extend(mode.exif_value())
    }

    /// Shutter release time
    pub fn timestamp(&mut self, ts: DateTime<FixedOffset>) -> &mut Self {
        let value = ts.to_rfc3339_opts(SecondsFormat::Secs, true);
        self.add("DateTimeOriginal", value.clone());
        self.add("ModifyDate", value)
    }

    pub fn make(&mut self, make: &str) -> &mut Self {
        self.add("Make", make)
    }

    pub fn model(&mut self, model: &str) -> &mut Self {
        self.add("Model", model)
    }

    pub fn serial_number(&mut self, serial: &str) -> &mut Self {
        self.add("SerialNumber", serial)
    }

    pub fn file_source(&mut self, source: FileSource) -> &mut Self {
        self.add("FileSource", source.as_str())
    }

    pub fn copyright(&mut self, copyright: &str) -> &mut Self {
        self.add("Copyright", copyright)
    }

    /// GPS track log to geotag from
    pub fn geotag(&mut self, track_file: &str) -> &mut Self {
        self.add("GeoTag", track_file)
    }

    /// Instant to look up in the GPS track
    pub fn geotime(&mut self, ts: DateTime<FixedOffset>) -> &mut Self {
        let offset = if ts.offset().local_minus_utc() == 0 {
            "Z".to_string()
        } else {
            ts.format("%:z").to_string()
        };
        self.add("GeoTime", format!("{}{}", ts.format("%Y:%m:%d %H:%M:%S"), offset))
    }

    pub fn set_date_time_digitized_from_create_date(&mut self) -> &mut Self {
        self.options.push(TagOp::copy_from("DateTimeDigitized", "CreateDate"));
        self
    }

    /// Full command line, every argument double-quoted
    pub fn cmd(&self) -> String {
        let mut parts = vec![self.binary.clone()];
        parts.extend(DEFAULT_OPTIONS.iter().map(|o| o.to_string()));
        parts.extend(self.options.iter().map(|o| quote(&o.to_string())));
        parts.push(quote(&self.filename));
        parts.join(" ")
    }

    fn add(&mut self, tag: &str, value: impl Into<String>) -> &mut Self {
        self.options.push(TagOp::assign(tag, value));
        self
    }

    fn extend(&mut self, tags: Vec<(&'static str, String)>) -> &mut Self {
        self.options
            .extend(tags.into_iter().map(|(tag, value)| TagOp::assign(tag, value)));
        self
    }
}

/// One command per frame of `film`, completed with the per-camera and
/// global settings from `config`
pub fn film_commands(film: &Film, config: &Config, names: &FilenameGenerator) -> Vec<ExifTool> {
    film.frames
        .iter()
        .map(|frame| {
            let filename = names.generate_filename(film.camera_id, film.id, frame.number);
            let mut et = ExifTool::from_frame(&config.exiftool_binary, filename, frame, film.iso);

            if let Some(make) = config.make_for(film.camera_id) {
                et.make(make);
            }
            if let Some(model) = config.model_for(film.camera_id) {
                et.model(model);
            }
            if let Some(serial) = config.serial_number_for(film.camera_id) {
                et.serial_number(serial);
            }
            if let Some(source) = config.file_source {
                et.file_source(source);
            }
            if let Some(copyright) = &config.copyright {
                et.copyright(copyright);
            }
            if let Some(track) = &config.geotag {
                et.geotag(&track.to_string_lossy());
                if let Some(ts) = frame.timestamp {
                    et.geotime(ts);
                }
            }
            if config.set_digitized {
                et.set_date_time_digitized_from_create_date();
            }

            et
        })
        .collect()
}

/// Shortest decimal that round-trips, `3.2` rather than `3.20`
fn format_decimal(value: f64) -> String {
    format!("{}", value)
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}
