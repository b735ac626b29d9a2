//! EXIF orientation correction for decoded images.
//!
//! Equalization tiles are laid out on the stored pixel grid, so images are
//! rotated upright before they are split into a [`PixelBuffer`](crate::PixelBuffer).

use image::DynamicImage;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::Path;

/// Orientation tag values 2..=8. Value 1 (and anything unreadable) means
/// the pixels are already upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    FlipHorizontal,
    Rotate180,
    FlipVertical,
    Transpose,
    Rotate90,
    Transverse,
    Rotate270,
}

impl Orientation {
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            2 => Some(Self::FlipHorizontal),
            3 => Some(Self::Rotate180),
            4 => Some(Self::FlipVertical),
            5 => Some(Self::Transpose),
            6 => Some(Self::Rotate90),
            7 => Some(Self::Transverse),
            8 => Some(Self::Rotate270),
            _ => None,
        }
    }

    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate270().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate90().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}

fn read_orientation<R: BufRead + Seek>(reader: &mut R) -> Option<Orientation> {
    let exif = exif::Reader::new().read_from_container(reader).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    Orientation::from_exif(field.value.get_uint(0)?)
}

/// Rotate/flip `img` according to the EXIF data of the file at `path`.
/// Returns the image unchanged when no usable tag is present.
pub fn apply_exif_orientation(img: DynamicImage, path: &Path) -> DynamicImage {
    let orientation = std::fs::File::open(path)
        .ok()
        .and_then(|file| read_orientation(&mut BufReader::new(file)));
    match orientation {
        Some(o) => o.apply(img),
        None => img,
    }
}

/// Same as [`apply_exif_orientation`] for an in-memory encoded image.
pub fn apply_exif_orientation_from_bytes(img: DynamicImage, bytes: &[u8]) -> DynamicImage {
    match read_orientation(&mut Cursor::new(bytes)) {
        Some(o) => o.apply(img),
        None => img,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn test_orientation_values() {
        assert_eq!(Orientation::from_exif(1), None);
        assert_eq!(Orientation::from_exif(6), Some(Orientation::Rotate90));
        assert_eq!(Orientation::from_exif(9), None);
    }

    #[test]
    fn test_rotate90_swaps_dimensions() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(4, 2));
        let rotated = Orientation::Rotate90.apply(img);
        assert_eq!((rotated.width(), rotated.height()), (2, 4));
    }

    #[test]
    fn test_bytes_without_exif_are_ignored() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(3, 1));
        let out = apply_exif_orientation_from_bytes(img, b"not an image");
        assert_eq!((out.width(), out.height()), (3, 1));
    }
}
