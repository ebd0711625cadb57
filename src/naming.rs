/**
 * Target filename generation
 *
 * Patterns contain `${name:spec}` tokens where `spec` is a printf-style
 * conversion: `[0][width][.precision](d|f|s)`, e.g. `${frameNo:05d}`.
 */

use log::warn;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_FILENAME_PATTERN: &str = "FILM_${cameraID:02d}${filmID:03d}${frameNo:05d}.dng";

const TOKEN_PATTERN: &str = r"\$\{(\w+):([^}]*)\}";
const SPEC_PATTERN: &str = r"^(0)?([1-9][0-9]*)?(?:\.([0-9]+))?([dfs])$";

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid conversion `{spec}` for variable `{name}`")]
    InvalidSpec { name: String, spec: String },

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// Value bound to a pattern variable
#[derive(Debug, Clone, PartialEq)]
pub enum FormatValue {
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatValue::Int(i) => write!(f, "{}", i),
            FormatValue::Float(v) => write!(f, "{}", v),
            FormatValue::Str(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Conversion {
    Decimal,
    Float,
    Str,
}

#[derive(Debug, Clone, PartialEq)]
struct FormatSpec {
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conversion: Conversion,
}

impl FormatSpec {
    fn apply(&self, value: &FormatValue) -> Option<String> {
        let body = match (self.conversion, value) {
            (Conversion::Decimal, FormatValue::Int(i)) => i.to_string(),
            (Conversion::Float, FormatValue::Int(i)) => format!("{:.*}", self.precision.unwrap_or(6), *i as f64),
            (Conversion::Float, FormatValue::Float(v)) => format!("{:.*}", self.precision.unwrap_or(6), v),
            (Conversion::Str, v) => match self.precision {
                Some(max) => v.to_string().chars().take(max).collect(),
                None => v.to_string(),
            },
            _ => return None,
        };

        Some(self.pad(body))
    }

    fn pad(&self, body: String) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }

        let fill = self.width - len;
        if self.zero_pad && self.conversion != Conversion::Str {
            match body.strip_prefix('-') {
                Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
                None => format!("{}{}", "0".repeat(fill), body),
            }
        } else {
            format!("{}{}", " ".repeat(fill), body)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Token { name: String, raw: String, spec: FormatSpec },
}

/// Renders target filenames from a validated pattern
#[derive(Debug, Clone)]
pub struct FilenameGenerator {
    segments: Vec<Segment>,
}

impl FilenameGenerator {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        let token_re = Regex::new(TOKEN_PATTERN)?;
        let spec_re = Regex::new(SPEC_PATTERN)?;

        let mut segments = Vec::new();
        let mut last = 0;

        for caps in token_re.captures_iter(pattern) {
            let (Some(whole), Some(name), Some(spec)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };

            let parsed = spec_re.captures(spec.as_str()).ok_or_else(|| PatternError::InvalidSpec {
                name: name.as_str().to_string(),
                spec: spec.as_str().to_string(),
            })?;

            let conversion = match parsed.get(4).map(|m| m.as_str()) {
                Some("d") => Conversion::Decimal,
                Some("f") => Conversion::Float,
                _ => Conversion::Str,
            };

            if whole.start() > last {
                segments.push(Segment::Literal(pattern[last..whole.start()].to_string()));
            }
            segments.push(Segment::Token {
                name: name.as_str().to_string(),
                raw: whole.as_str().to_string(),
                spec: FormatSpec {
                    zero_pad: parsed.get(1).is_some(),
                    width: parsed.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
                    precision: parsed.get(3).and_then(|m| m.as_str().parse().ok()),
                    conversion,
                },
            });
            last = whole.end();
        }

        if last < pattern.len() {
            segments.push(Segment::Literal(pattern[last..].to_string()));
        }

        Ok(Self { segments })
    }

    /// Substitute variables; tokens with no (or mismatched) value are kept verbatim
    pub fn render(&self, vars: &HashMap<&str, FormatValue>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token { name, raw, spec } => {
                    match vars.get(name.as_str()).and_then(|v| spec.apply(v)) {
                        Some(rendered) => out.push_str(&rendered),
                        None => {
                            warn!("Cannot substitute `{}` in filename pattern", raw);
                            out.push_str(raw);
                        }
                    }
                }
            }
        }
        out
    }

    /// Filename for one frame; binds `cameraID`, `filmID` and `frameNo`
    pub fn generate_filename(&self, camera_id: i64, film_id: i64, frame_no: i64) -> String {
        let vars = HashMap::from([
            ("cameraID", FormatValue::Int(camera_id)),
            ("filmID", FormatValue::Int(film_id)),
            ("frameNo", FormatValue::Int(frame_no)),
        ]);
        self.render(&vars)
    }
}

impl Default for FilenameGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_FILENAME_PATTERN).unwrap_or(Self { segments: Vec::new() })
    }
}
