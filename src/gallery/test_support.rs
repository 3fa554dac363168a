use super::Gallery;
use image::{ImageBuffer, ImageFormat, Rgb};
use std::io::Cursor;
use std::path::Path;

/// A gallery rooted at `<base>/pics` with its placeholder at `<base>/static/file.png`.
pub(crate) fn gallery_in(base: &Path) -> Gallery {
    let source_directory = base.join("pics");
    std::fs::create_dir_all(&source_directory).unwrap();

    let config = crate::GalleryConfig {
        source_directory,
        ..Default::default()
    };
    Gallery::new(config, base.join("static").join("file.png"))
}

pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x * 3) as u8, (y * 3) as u8, 128])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();
    bytes
}

pub(crate) fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, jpeg_bytes(width, height)).unwrap();
}

pub(crate) fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = ImageBuffer::from_pixel(width, height, Rgb([10u8, 200, 30]));
    img.save(path).unwrap();
}

/// A small JPEG with an APP1 segment carrying `payload` right after SOI.
pub(crate) fn jpeg_with_app1(payload: &[u8]) -> Vec<u8> {
    let jpeg = jpeg_bytes(8, 8);
    let size = (payload.len() + 2) as u16;

    let mut out = Vec::with_capacity(jpeg.len() + payload.len() + 4);
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// A JPEG whose EXIF block holds Make, ExposureTime (1/250), FNumber,
/// ISOSpeedRatings and Flash set to `flash`.
pub(crate) fn jpeg_with_exif(flash: u16) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&exif_tiff(flash));
    jpeg_with_app1(&payload)
}

fn exif_tiff(flash: u16) -> Vec<u8> {
    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    const RATIONAL: u16 = 5;

    fn entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: u32) {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&value.to_le_bytes());
    }

    // Layout: header(8) IFD0(30) "Canon\0"(6) ExifIFD(54) two rationals(16)
    let make_offset = 38;
    let exif_ifd_offset = 44;
    let exposure_offset = 98;
    let fnumber_offset = 106;

    let mut out = Vec::new();
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());

    out.extend_from_slice(&2u16.to_le_bytes());
    entry(&mut out, 0x010F, ASCII, 6, make_offset);
    entry(&mut out, 0x8769, LONG, 1, exif_ifd_offset);
    out.extend_from_slice(&0u32.to_le_bytes());

    out.extend_from_slice(b"Canon\0");

    out.extend_from_slice(&4u16.to_le_bytes());
    entry(&mut out, 0x829A, RATIONAL, 1, exposure_offset);
    entry(&mut out, 0x829D, RATIONAL, 1, fnumber_offset);
    entry(&mut out, 0x8827, SHORT, 1, 200);
    entry(&mut out, 0x9209, SHORT, 1, u32::from(flash));
    out.extend_from_slice(&0u32.to_le_bytes());

    for (numerator, denominator) in [(1u32, 250u32), (28, 10)] {
        out.extend_from_slice(&numerator.to_le_bytes());
        out.extend_from_slice(&denominator.to_le_bytes());
    }

    debug_assert_eq!(out.len(), 114);
    out
}
