/**
 * Parser for the data-logger CSV export
 *
 * The export is not real CSV: it is an unquoted, comma-separated dump where a
 * film header line opens each roll, an optional remarks line follows it, a
 * column header line precedes the frames, and each data row describes one
 * exposure by column position. Several rolls can follow each other in one file.
 */

use chrono::TimeZone;
use log::{debug, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use crate::error::ParseError;
use crate::film::{Film, Frame};
use crate::modes::Aperture;
use crate::timestamp::{self, CameraTimezone, TimestampFormat};

/// Columns in a frame data row
pub const FRAME_COLUMNS: usize = 21;

/// Columns a film header needs to reach the ISO field
const FILM_HEADER_COLUMNS: usize = 12;

/// What a single non-blank line of the export is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    FilmHeader,
    RemarksHeader,
    FrameHeader,
    DataRow,
}

closed_set! {
    /// What to do with a data row that has nothing but flag and frame number
    pub enum EmptyFramePolicy ("EmptyFramePolicy") {
        /// Drop the row and keep parsing
        Skip => "skip",
        /// Fail the whole parse
        Abort => "abort",
    }
}

impl Default for EmptyFramePolicy {
    fn default() -> Self {
        EmptyFramePolicy::Skip
    }
}

/// Classify a newline-stripped, non-blank line
pub fn classify(line: &str) -> LineKind {
    // header lines may carry the camera's select marker
    let unmarked = line.trim_start_matches('*');

    if unmarked.starts_with(",Film ID,") {
        LineKind::FilmHeader
    } else if line.starts_with(",Remarks,") {
        LineKind::RemarksHeader
    } else if unmarked.starts_with(",Frame No.,") {
        LineKind::FrameHeader
    } else {
        LineKind::DataRow
    }
}

/// Decode a film header line.
///
/// The load timestamp is resolved in the timezone of the camera named by the
/// header's `<cameraID>-<filmID>` column.
pub fn decode_film<Z: CameraTimezone>(
    line: &str,
    zones: &Z,
    format: TimestampFormat,
) -> Result<Film, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < FILM_HEADER_COLUMNS {
        return Err(ParseError::Structural(format!(
            "wrong amount of columns for film header: {}: `{}`",
            fields.len(),
            line
        )));
    }

    let (camera_id, id) = parse_film_id(fields[2])?;
    let tz = zones.timezone_for(camera_id);

    let film_loaded_timestamp = timestamp::resolve(fields[6], fields[7], &tz, format)
        .map_err(|e| ParseError::TimestampFormatHint { source: Box::new(e) })?;

    Ok(Film {
        title: parse_text(fields[4]),
        film_loaded_timestamp,
        frame_count: parse_int(fields[9], "film frame count")?,
        iso: parse_int(fields[11], "film ISO")?,
        ..Film::new(camera_id, id)
    })
}

/// Remarks text of a remarks header line, embedded commas preserved
pub fn decode_remarks(line: &str) -> Option<String> {
    line.splitn(3, ',').nth(2).and_then(parse_text)
}

/// Decode one frame data row.
///
/// Returns [`ParseError::EmptyFrame`] when every column after the frame number
/// is blank. Per-field failures are wrapped with the frame number.
pub fn decode_frame<Tz: TimeZone>(
    line: &str,
    tz: &Tz,
    format: TimestampFormat,
) -> Result<Frame, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FRAME_COLUMNS {
        return Err(ParseError::Structural(format!(
            "wrong amount of columns for frame: {}: `{}`",
            fields.len(),
            line
        )));
    }

    if fields[2..].iter().all(|f| f.trim().is_empty()) {
        return Err(ParseError::EmptyFrame);
    }

    let number = parse_int(fields[1], "frame number")?.ok_or_else(|| ParseError::MalformedValue {
        field: "frame number",
        value: fields[1].to_string(),
    })?;

    decode_frame_fields(number, &fields, tz, format).map_err(|e| e.in_frame(number))
}

fn decode_frame_fields<Tz: TimeZone>(
    number: i64,
    fields: &[&str],
    tz: &Tz,
    format: TimestampFormat,
) -> Result<Frame, ParseError> {
    let timestamp = timestamp::resolve(fields[15], fields[16], tz, format)
        .map_err(|e| ParseError::TimestampFormatHint { source: Box::new(e) })?;

    // best-effort: the battery date is often garbage on older firmware
    let battery_loaded_date = timestamp::resolve(fields[18], fields[19], tz, format)
        .unwrap_or_else(|e| {
            debug!("Ignoring battery-loaded timestamp of frame {}: {}", number, e);
            None
        });

    Ok(Frame {
        flag: fields[0].trim() == "*",
        number,
        focal_length: parse_int(fields[2].trim().trim_end_matches("mm"), "focal length")?,
        max_aperture: parse_value::<Aperture>(fields[3])?,
        tv: parse_exposure(fields[4]),
        av: parse_value(fields[5])?,
        iso: parse_int(fields[6], "ISO")?,
        exposure_compensation: parse_float(fields[7], "exposure compensation")?,
        flash_compensation: parse_float(fields[8], "flash compensation")?,
        flash_mode: parse_value(fields[9])?,
        metering_mode: parse_value(fields[10])?,
        shooting_mode: parse_value(fields[11])?,
        film_advance_mode: parse_value(fields[12])?,
        af_mode: parse_value(fields[13])?,
        bulb_exposure_time: parse_text(fields[14]),
        timestamp,
        multiple_exposure: parse_value(fields[17])?,
        battery_loaded_date,
        remarks: parse_text(fields[20]),
    })
}

fn parse_film_id(raw: &str) -> Result<(i64, i64), ParseError> {
    let improper = || {
        ParseError::Structural(format!(
            "improper film ID `{}`: expected <cameraID>-<filmID>",
            raw
        ))
    };

    let ids: Vec<&str> = raw.split('-').collect();
    if ids.len() != 2 {
        return Err(improper());
    }

    let camera_id = ids[0].trim().parse::<i64>().map_err(|_| improper())?;
    let film_id = ids[1].trim().parse::<i64>().map_err(|_| improper())?;
    Ok((camera_id, film_id))
}

fn parse_value<T: FromStr<Err = ParseError>>(raw: &str) -> Result<Option<T>, ParseError> {
    match raw.parse::<T>() {
        Ok(value) => Ok(Some(value)),
        Err(ParseError::EmptyValue) => Ok(None),
        Err(e) => Err(e),
    }
}

fn parse_int(raw: &str, field: &'static str) -> Result<Option<i64>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ParseError::MalformedValue {
            field,
            value: raw.to_string(),
        })
}

fn parse_float(raw: &str, field: &'static str) -> Result<Option<f64>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(ParseError::MalformedValue {
            field,
            value: raw.to_string(),
        }),
    }
}

fn parse_text(raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Shutter speed with the `="..."` wrapping spreadsheet exports add
fn parse_exposure(raw: &str) -> Option<String> {
    let cleaned: String = raw.chars().filter(|c| *c != '"' && *c != '=').collect();
    parse_text(cleaned.trim())
}

enum ParseState {
    NoOpenFilm,
    FilmOpen(Film),
}

/// Streaming parser over one export.
///
/// The reader is owned for the duration of [`CsvParser::parse`] and dropped
/// when it returns, whatever the outcome.
pub struct CsvParser<R, Z> {
    reader: R,
    zones: Z,
    format: TimestampFormat,
    empty_frame_policy: EmptyFramePolicy,
}

impl<Z: CameraTimezone> CsvParser<BufReader<File>, Z> {
    pub fn open(path: impl AsRef<Path>, zones: Z, format: TimestampFormat) -> Result<Self, ParseError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::new(file), zones, format))
    }
}

impl<R: BufRead, Z: CameraTimezone> CsvParser<R, Z> {
    pub fn new(reader: R, zones: Z, format: TimestampFormat) -> Self {
        Self {
            reader,
            zones,
            format,
            empty_frame_policy: EmptyFramePolicy::default(),
        }
    }

    pub fn with_empty_frame_policy(mut self, policy: EmptyFramePolicy) -> Self {
        self.empty_frame_policy = policy;
        self
    }

    /// Parse the whole stream into films, in source order
    pub fn parse(mut self) -> Result<Vec<Film>, ParseError> {
        let mut films = Vec::new();
        let mut state = ParseState::NoOpenFilm;
        let mut buf = Vec::new();
        let mut line_no = 0;

        while let Some(raw) = self.next_line(&mut buf)? {
            line_no += 1;
            // U+00A0 is Latin-1 text here, not a separator
            let line = raw.trim_matches(|c: char| c.is_ascii_whitespace());
            if line.is_empty() {
                continue;
            }

            state = self
                .step(state, line, &mut films)
                .map_err(|e| e.at_line(line_no))?;
        }

        if let ParseState::FilmOpen(film) = state {
            films.push(film);
        }

        debug!("Parsed {} films from {} lines", films.len(), line_no);
        Ok(films)
    }

    /// Next line decoded one byte per char (ISO-8859-1)
    fn next_line(&mut self, buf: &mut Vec<u8>) -> Result<Option<String>, ParseError> {
        buf.clear();
        if self.reader.read_until(b'\n', buf)? == 0 {
            return Ok(None);
        }
        Ok(Some(buf.iter().map(|&b| b as char).collect()))
    }

    fn step(&self, state: ParseState, line: &str, films: &mut Vec<Film>) -> Result<ParseState, ParseError> {
        match (classify(line), state) {
            (LineKind::FilmHeader, state) => {
                if let ParseState::FilmOpen(done) = state {
                    films.push(done);
                }

                let film = decode_film(line, &self.zones, self.format)?;
                debug!("Opened film {:02}-{:03}", film.camera_id, film.id);
                Ok(ParseState::FilmOpen(film))
            }
            (LineKind::FrameHeader, state) => Ok(state),
            (LineKind::RemarksHeader, ParseState::FilmOpen(mut film)) => {
                film.remarks = decode_remarks(line);
                Ok(ParseState::FilmOpen(film))
            }
            (LineKind::DataRow, ParseState::FilmOpen(mut film)) => {
                let tz = self.zones.timezone_for(film.camera_id);
                match decode_frame(line, &tz, self.format) {
                    Ok(frame) => film.frames.push(frame),
                    Err(ParseError::EmptyFrame) if self.empty_frame_policy == EmptyFramePolicy::Skip => {
                        let number = line.split(',').nth(1).unwrap_or_default().trim();
                        warn!(
                            "Skipping frame {} of film {:02}-{:03}: no data recorded",
                            number, film.camera_id, film.id
                        );
                    }
                    Err(e) => return Err(e),
                }
                Ok(ParseState::FilmOpen(film))
            }
            (kind, ParseState::NoOpenFilm) => Err(ParseError::Structural(format!(
                "{:?} line found before any film header",
                kind
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modes::{AfMode, FilmAdvanceMode, FlashMode, MeteringMode, MultipleExposure, ShootingMode};
    use chrono::{FixedOffset, Utc};
    use std::io::Cursor;

    const FILM_HEADER: &str =
        "*,Film ID,03-758,Title,Sample,Date and time film loaded,9/1/2010,14:00:00,Frame count,36,ISO (DX),200";
    const FRAME_HEADER: &str = ",Frame No.,Focal length,Max. aperture,Tv,Av,ISO (M),Exposure compensation,\
        Flash exposure compensation,Flash mode,Metering mode,Shooting mode,Film advance mode,AF mode,\
        Bulb exposure time,Date,Time,Multiple exposure,Battery-loaded date,Battery-loaded time,Remarks";

    fn row(fields: [&str; FRAME_COLUMNS]) -> String {
        fields.join(",")
    }

    fn full_row() -> [&'static str; FRAME_COLUMNS] {
        [
            "*",
            "2",
            "35mm",
            "1.4",
            "=\"1/60\"",
            "2.8",
            "400",
            "-5",
            "-4.5",
            "OFF",
            "Evaluative",
            "Aperture-priority AE",
            "Single-frame",
            "One-Shot AF",
            "",
            "10/7/2019",
            "20:02:29",
            "OFF",
            "",
            "",
            "test frame #2",
        ]
    }

    fn empty_row(number: &'static str) -> [&'static str; FRAME_COLUMNS] {
        let mut fields = [""; FRAME_COLUMNS];
        fields[1] = number;
        fields
    }

    fn parse(input: &str) -> Result<Vec<Film>, ParseError> {
        CsvParser::new(Cursor::new(input.as_bytes().to_vec()), Utc, TimestampFormat::Us).parse()
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(FILM_HEADER), LineKind::FilmHeader);
        assert_eq!(classify(&FILM_HEADER[1..]), LineKind::FilmHeader);
        assert_eq!(classify(&format!("**{}", FILM_HEADER)), LineKind::FilmHeader);
        assert_eq!(classify(",Remarks,some text"), LineKind::RemarksHeader);
        assert_eq!(classify("*,Remarks,some text"), LineKind::DataRow);
        assert_eq!(classify(FRAME_HEADER), LineKind::FrameHeader);
        assert_eq!(classify(&format!("*{}", FRAME_HEADER)), LineKind::FrameHeader);
        assert_eq!(classify(&row(full_row())), LineKind::DataRow);
        assert_eq!(classify("Film ID,03-758"), LineKind::DataRow);
    }

    #[test]
    fn test_decode_film_header() {
        let film = decode_film(FILM_HEADER, &Utc, TimestampFormat::Us).unwrap();
        assert_eq!(film.camera_id, 3);
        assert_eq!(film.id, 758);
        assert_eq!(film.title.as_deref(), Some("Sample"));
        assert_eq!(film.frame_count, Some(36));
        assert_eq!(film.iso, Some(200));
        assert_eq!(
            film.film_loaded_timestamp.map(|ts| ts.to_rfc3339()),
            Some("2010-09-01T14:00:00+00:00".to_string())
        );
        assert!(film.frames.is_empty());
        assert!(film.remarks.is_none());
    }

    #[test]
    fn test_decode_film_blank_numbers_are_absent() {
        let line = ",Film ID,1-139,Title,,Date and time film loaded,,,Frame count, ,ISO (DX),";
        let film = decode_film(line, &Utc, TimestampFormat::Us).unwrap();
        assert_eq!((film.camera_id, film.id), (1, 139));
        assert_eq!(film.title, None);
        assert_eq!(film.frame_count, None);
        assert_eq!(film.iso, None);
        assert_eq!(film.film_loaded_timestamp, None);
    }

    #[test]
    fn test_decode_film_malformed_fields() {
        let line = FILM_HEADER.replace(",36,", ",thirty-six,");
        assert!(matches!(
            decode_film(&line, &Utc, TimestampFormat::Us),
            Err(ParseError::MalformedValue { field: "film frame count", .. })
        ));

        let line = FILM_HEADER.replace("03-758", "03758");
        assert!(matches!(
            decode_film(&line, &Utc, TimestampFormat::Us),
            Err(ParseError::Structural(_))
        ));

        let line = FILM_HEADER.replace("03-758", "03-75-8");
        assert!(matches!(
            decode_film(&line, &Utc, TimestampFormat::Us),
            Err(ParseError::Structural(_))
        ));

        let line = FILM_HEADER.replace("03-758", "A3-758");
        assert!(matches!(
            decode_film(&line, &Utc, TimestampFormat::Us),
            Err(ParseError::Structural(_))
        ));

        assert!(matches!(
            decode_film(",Film ID,03-758,Title", &Utc, TimestampFormat::Us),
            Err(ParseError::Structural(_))
        ));
    }

    #[test]
    fn test_decode_film_uses_camera_timezone() {
        struct PerCamera;
        impl CameraTimezone for PerCamera {
            type Tz = FixedOffset;
            fn timezone_for(&self, camera_id: i64) -> FixedOffset {
                FixedOffset::east_opt(camera_id as i32 * 3600).unwrap()
            }
        }

        let film = decode_film(FILM_HEADER, &PerCamera, TimestampFormat::Us).unwrap();
        let ts = film.film_loaded_timestamp.unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_decode_remarks_keeps_commas() {
        assert_eq!(
            decode_remarks(",Remarks,shot at dusk, tripod, no filter"),
            Some("shot at dusk, tripod, no filter".to_string())
        );
        assert_eq!(decode_remarks(",Remarks,"), None);
        assert_eq!(decode_remarks(",Remarks"), None);
    }

    #[test]
    fn test_decode_full_frame() {
        let frame = decode_frame(&row(full_row()), &Utc, TimestampFormat::Us).unwrap();
        assert!(frame.flag);
        assert_eq!(frame.number, 2);
        assert_eq!(frame.focal_length, Some(35));
        assert_eq!(frame.max_aperture, Some(Aperture::new(1.4)));
        assert_eq!(frame.tv.as_deref(), Some("1/60"));
        assert_eq!(frame.av, Some(Aperture::new(2.8)));
        assert_eq!(frame.iso, Some(400));
        assert_eq!(frame.exposure_compensation, Some(-5.0));
        assert_eq!(frame.flash_compensation, Some(-4.5));
        assert_eq!(frame.flash_mode, Some(FlashMode::Off));
        assert_eq!(frame.metering_mode, Some(MeteringMode::Evaluative));
        assert_eq!(frame.shooting_mode, Some(ShootingMode::AperturePriorityAe));
        assert_eq!(frame.film_advance_mode, Some(FilmAdvanceMode::SingleFrame));
        assert_eq!(frame.af_mode, Some(AfMode::OneShotAf));
        assert_eq!(frame.bulb_exposure_time, None);
        assert_eq!(
            frame.timestamp.map(|ts| ts.to_rfc3339()),
            Some("2019-10-07T20:02:29+00:00".to_string())
        );
        assert_eq!(frame.multiple_exposure, Some(MultipleExposure::Off));
        assert_eq!(frame.battery_loaded_date, None);
        assert_eq!(frame.remarks.as_deref(), Some("test frame #2"));
    }

    #[test]
    fn test_zero_compensation_is_recorded() {
        let mut fields = full_row();
        fields[7] = "0";
        fields[0] = "";
        let frame = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap();
        assert_eq!(frame.exposure_compensation, Some(0.0));
        assert!(!frame.flag);
    }

    #[test]
    fn test_flag_and_number_only_is_empty_frame() {
        let mut fields = empty_row("5");
        fields[0] = "*";
        fields[3] = "  ";
        assert!(matches!(
            decode_frame(&row(fields), &Utc, TimestampFormat::Us),
            Err(ParseError::EmptyFrame)
        ));
    }

    #[test]
    fn test_wrong_column_count_is_structural() {
        let short = full_row()[..20].join(",");
        assert!(matches!(
            decode_frame(&short, &Utc, TimestampFormat::Us),
            Err(ParseError::Structural(_))
        ));

        let long = format!("{},extra", row(full_row()));
        assert!(matches!(
            decode_frame(&long, &Utc, TimestampFormat::Us),
            Err(ParseError::Structural(_))
        ));
    }

    #[test]
    fn test_unknown_enum_is_wrapped_with_frame_number() {
        let mut fields = full_row();
        fields[10] = "Matrix";
        let err = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap_err();
        assert_eq!(err.frame_number(), Some(2));
        match err.root() {
            ParseError::UnknownValue { kind, value } => {
                assert_eq!(*kind, "MeteringMode");
                assert_eq!(value, "Matrix");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_iso_is_fatal() {
        let mut fields = full_row();
        fields[6] = "4OO";
        let err = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap_err();
        assert!(matches!(err.root(), ParseError::MalformedValue { field: "ISO", .. }));
    }

    #[test]
    fn test_missing_frame_number_is_malformed() {
        let mut fields = full_row();
        fields[1] = "";
        assert!(matches!(
            decode_frame(&row(fields), &Utc, TimestampFormat::Us),
            Err(ParseError::MalformedValue { field: "frame number", .. })
        ));
    }

    #[test]
    fn test_bad_shutter_timestamp_carries_format_hint() {
        let mut fields = full_row();
        fields[15] = "28/09/2019";
        let err = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap_err();
        match &err {
            ParseError::Frame { number: 2, source } => {
                assert!(matches!(**source, ParseError::TimestampFormatHint { .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(err.root(), ParseError::Timestamp { .. }));
    }

    #[test]
    fn test_bad_battery_timestamp_is_absent() {
        let mut fields = full_row();
        fields[18] = "not a date";
        fields[19] = "12:00:00";
        let frame = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap();
        assert_eq!(frame.battery_loaded_date, None);

        fields[18] = "1/5/2008";
        let frame = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap();
        assert!(frame.battery_loaded_date.is_some());
    }

    #[test]
    fn test_tv_artifacts_are_stripped() {
        let mut fields = full_row();
        fields[4] = "=\"0\"\"5\"";
        let frame = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap();
        assert_eq!(frame.tv.as_deref(), Some("05"));

        fields[4] = "30";
        let frame = decode_frame(&row(fields), &Utc, TimestampFormat::Us).unwrap();
        assert_eq!(frame.tv.as_deref(), Some("30"));
    }

    #[test]
    fn test_two_films_in_order() {
        let input = [
            FILM_HEADER.to_string(),
            ",Remarks,first, roll".to_string(),
            FRAME_HEADER.to_string(),
            row(full_row()),
            "".to_string(),
            ",Film ID,03-759,Title,Second,Date and time film loaded,9/2/2010,09:00:00,Frame count,24,ISO (DX),400"
                .to_string(),
            FRAME_HEADER.to_string(),
            row(full_row()).replacen("*,2,", ",1,", 1),
            row(full_row()).replacen("*,2,", ",2,", 1),
        ]
        .join("\r\n");

        let films = parse(&input).unwrap();
        assert_eq!(films.len(), 2);

        assert_eq!(films[0].id, 758);
        assert_eq!(films[0].remarks.as_deref(), Some("first, roll"));
        assert_eq!(films[0].frames.len(), 1);
        assert_eq!(films[0].frames[0].number, 2);
        assert_eq!(films[0].frames[0].remarks.as_deref(), Some("test frame #2"));

        assert_eq!(films[1].id, 759);
        assert_eq!(films[1].iso, Some(400));
        assert_eq!(films[1].remarks, None);
        let numbers: Vec<i64> = films[1].frames.iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn test_parse_keeps_raw_iso() {
        let mut fields = full_row();
        fields[6] = "";
        let input = format!("{}\n{}\n", FILM_HEADER, row(fields));
        let films = parse(&input).unwrap();
        let frame = &films[0].frames[0];
        assert_eq!(frame.iso, None);
        assert_eq!(frame.effective_iso(films[0].iso), Some(200));
    }

    #[test]
    fn test_empty_frame_policy() {
        let input = format!(
            "{}\n{}\n{}\n",
            FILM_HEADER,
            row(empty_row("1")),
            row(full_row())
        );

        let films = parse(&input).unwrap();
        assert_eq!(films[0].frames.len(), 1);
        assert_eq!(films[0].frames[0].number, 2);

        let err = CsvParser::new(Cursor::new(input.into_bytes()), Utc, TimestampFormat::Us)
            .with_empty_frame_policy(EmptyFramePolicy::Abort)
            .parse()
            .unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 2, .. }));
        assert!(matches!(err.root(), ParseError::EmptyFrame));
    }

    #[test]
    fn test_rows_before_film_header_are_structural() {
        let err = parse(&format!("{}\n", row(full_row()))).unwrap_err();
        assert!(matches!(err.root(), ParseError::Structural(_)));

        let err = parse(",Remarks,orphan\n").unwrap_err();
        assert!(matches!(err.root(), ParseError::Structural(_)));
    }

    #[test]
    fn test_empty_input_has_no_films() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\n\r\n  \n").unwrap().is_empty());
        // a lone column header never opens a film
        assert!(parse(&format!("{}\n", FRAME_HEADER)).unwrap().is_empty());
    }

    #[test]
    fn test_single_byte_encoding() {
        let mut input = format!("{}\n", FILM_HEADER.replace("Sample", "Caf")).into_bytes();
        // 'Café' in ISO-8859-1
        let pos = input.iter().position(|&b| b == b'f').unwrap() + 1;
        input.insert(pos, 0xE9);

        let films = CsvParser::new(Cursor::new(input), Utc, TimestampFormat::Us)
            .parse()
            .unwrap();
        assert_eq!(films[0].title.as_deref(), Some("Café"));
    }
}
