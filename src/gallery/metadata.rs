use super::{ExifMode, ExifReport, ExifRow, GalleryError, ImageMetadata, probe_dimensions};
use rexif::{ExifEntry, ExifTag, TagValue};
use std::path::Path;
use tracing::{debug, trace, warn};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Largest denominator used when simplifying exposure times.
const MAX_EXPOSURE_DENOMINATOR: u64 = 1_000_000;

/// Fields shown on the photo page by default, in display order.
const SUMMARY_FIELDS: [(&str, ExifTag); 8] = [
    ("Camera manufacturer", ExifTag::Make),
    ("Camera model", ExifTag::Model),
    ("Exposure", ExifTag::ExposureTime),
    ("Aperture", ExifTag::FNumber),
    ("Focal length", ExifTag::FocalLength),
    ("ISO", ExifTag::ISOSpeedRatings),
    ("Flash", ExifTag::Flash),
    ("Date taken", ExifTag::DateTimeOriginal),
];

/// Tags that only carry container bookkeeping.
const INTERNAL_TAGS: [&str; 4] = ["UnknownToMe", "MakerNote", "ExifOffset", "GPSOffset"];

/// File size plus pixel dimensions when the file decodes as an image.
pub fn read_image_metadata(path: &Path) -> Result<ImageMetadata, GalleryError> {
    let size_bytes = std::fs::metadata(path)?.len();
    let dimensions = match probe_dimensions(path) {
        Ok(dimensions) => Some(dimensions),
        Err(e) => {
            trace!("No dimensions for {:?}: {}", path, e);
            None
        }
    };

    Ok(ImageMetadata {
        size_bytes,
        dimensions,
    })
}

impl ImageMetadata {
    /// Size in MB rounded to two places, e.g. `1.25mb (4000x3000)`.
    pub fn summary(&self) -> String {
        let size_mb = (self.size_bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0;
        match self.dimensions {
            Some((width, height)) => format!("{}mb ({}x{})", size_mb, width, height),
            None => format!("{}mb", size_mb),
        }
    }
}

/// Read the EXIF block of a photo and shape it for the photo page.
///
/// A missing EXIF segment is a normal outcome. Any other failure is
/// reported inline so the page still renders.
pub fn read_exif(path: &Path, mode: ExifMode, more_info_href: &str) -> ExifReport {
    let contents = match std::fs::read(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read {:?} for EXIF: {}", path, e);
            return ExifReport::Failed {
                message: e.to_string(),
            };
        }
    };

    let (result, warnings) = rexif::parse_buffer_quiet(&contents);
    if !warnings.is_empty() {
        debug!("EXIF warnings for {:?}: {:?}", path, warnings);
    }

    let exif = match result {
        Ok(exif) => exif,
        Err(rexif::ExifError::JpegWithoutExif(_)) | Err(rexif::ExifError::FileTypeUnknown) => {
            trace!("No EXIF data in {:?}", path);
            return ExifReport::Unavailable;
        }
        Err(e) => {
            warn!("Failed to parse EXIF for {:?}: {}", path, e);
            return ExifReport::Failed {
                message: e.to_string(),
            };
        }
    };

    if exif.entries.is_empty() {
        return ExifReport::Unavailable;
    }

    match mode {
        ExifMode::Summary => ExifReport::Table {
            rows: summary_rows(&exif.entries),
            more_info_href: Some(more_info_href.to_string()),
        },
        ExifMode::Full => ExifReport::Table {
            rows: full_rows(&exif.entries),
            more_info_href: None,
        },
    }
}

fn summary_rows(entries: &[ExifEntry]) -> Vec<ExifRow> {
    SUMMARY_FIELDS
        .iter()
        .filter_map(|(label, tag)| {
            let entry = entries.iter().find(|e| e.tag == *tag)?;
            let value = match entry.tag {
                ExifTag::ExposureTime => exposure_text(&entry.value)
                    .unwrap_or_else(|| entry.value_more_readable.trim().to_string()),
                _ => display_value(entry),
            };
            Some(ExifRow {
                label: label.to_string(),
                value,
            })
        })
        .collect()
}

fn full_rows(entries: &[ExifEntry]) -> Vec<ExifRow> {
    entries
        .iter()
        .filter_map(|entry| {
            let label = format!("{:?}", entry.tag);
            if INTERNAL_TAGS.contains(&label.as_str()) {
                return None;
            }
            Some(ExifRow {
                value: display_value(entry),
                label,
            })
        })
        .collect()
}

fn display_value(entry: &ExifEntry) -> String {
    match entry.tag {
        ExifTag::Flash => flash_phrase(flash_fired(&entry.value)).to_string(),
        _ => entry.value_more_readable.trim().to_string(),
    }
}

/// Bit 0 of the EXIF flash field records whether the flash fired.
pub fn flash_fired(value: &TagValue) -> bool {
    let code = match value {
        TagValue::U16(values) => values.first().map(|&v| u32::from(v)),
        TagValue::U8(values) => values.first().map(|&v| u32::from(v)),
        TagValue::U32(values) => values.first().copied(),
        _ => None,
    };
    code.is_some_and(|code| code & 1 == 1)
}

pub fn flash_phrase(fired: bool) -> &'static str {
    if fired {
        "Flash fired"
    } else {
        "Flash was not fired"
    }
}

/// `1/250 sec`, `2 sec`, `5/2 sec`.
fn exposure_text(value: &TagValue) -> Option<String> {
    let TagValue::URational(values) = value else {
        return None;
    };
    let rational = values.first()?;
    let (numerator, denominator) = simplify_fraction(
        u64::from(rational.numerator),
        u64::from(rational.denominator),
        MAX_EXPOSURE_DENOMINATOR,
    )?;

    if denominator == 1 {
        Some(format!("{} sec", numerator))
    } else {
        Some(format!("{}/{} sec", numerator, denominator))
    }
}

/// Closest fraction to `numerator / denominator` whose denominator does not
/// exceed `max_denominator`. Returns `None` for a zero denominator.
pub fn simplify_fraction(
    numerator: u64,
    denominator: u64,
    max_denominator: u64,
) -> Option<(u64, u64)> {
    if denominator == 0 || max_denominator == 0 {
        return None;
    }

    let divisor = gcd(numerator, denominator);
    let (n, d) = (numerator / divisor, denominator / divisor);
    if d <= max_denominator {
        return Some((n, d));
    }

    // Walk the continued fraction expansion until the next convergent would
    // overshoot the denominator limit.
    let (mut p0, mut q0, mut p1, mut q1) = (0u64, 1u64, 1u64, 0u64);
    let (mut num, mut den) = (n, d);
    loop {
        let a = num / den;
        let q2 = q0 + a * q1;
        if q2 > max_denominator {
            break;
        }
        (p0, q0, p1, q1) = (p1, q1, p0 + a * p1, q2);
        (num, den) = (den, num - a * den);
        if den == 0 {
            break;
        }
    }

    let k = (max_denominator - q0) / q1;
    let lower = (p0 + k * p1, q0 + k * q1);
    let upper = (p1, q1);

    let target = n as f64 / d as f64;
    let distance = |(p, q): (u64, u64)| (p as f64 / q as f64 - target).abs();
    if distance(upper) <= distance(lower) {
        Some(upper)
    } else {
        Some(lower)
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}
