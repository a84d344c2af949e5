use hardsub_types::{CropRegion, LumaFrame, SampledFrame};
use image::DynamicImage;

use crate::error::VideoError;

/// Decodes a sampled still and returns only its bottom subtitle band as luma.
pub fn load_cropped_frame(frame: &SampledFrame, crop_ratio: f64) -> Result<LumaFrame, VideoError> {
    let image = image::open(frame.path()).map_err(|source| VideoError::Image {
        path: frame.path().to_path_buf(),
        source,
    })?;
    let luma = crop_subtitle_band(&image, crop_ratio)?;
    Ok(luma.with_frame_index(Some(frame.index())))
}

/// Cuts the bottom `crop_ratio` of `image` and converts it to 8-bit luma.
pub fn crop_subtitle_band(image: &DynamicImage, crop_ratio: f64) -> Result<LumaFrame, VideoError> {
    let region = CropRegion::bottom_band(image.width(), image.height(), crop_ratio)?;
    let band = image
        .crop_imm(0, region.top, region.width, region.height)
        .to_luma8();
    let (width, height) = band.dimensions();
    Ok(LumaFrame::from_owned(
        width,
        height,
        width as usize,
        band.into_raw(),
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn striped(width: u32, height: u32) -> DynamicImage {
        // Each row's value is its y coordinate so crops can be located.
        let image = GrayImage::from_fn(width, height, |_, y| Luma([y as u8]));
        DynamicImage::ImageLuma8(image)
    }

    #[test]
    fn keeps_bottom_rows_only() {
        let luma = crop_subtitle_band(&striped(8, 100), 0.2).unwrap();
        assert_eq!(luma.width(), 8);
        assert_eq!(luma.height(), 20);
        assert_eq!(luma.data()[0], 80);
        assert_eq!(*luma.data().last().unwrap(), 99);
    }

    #[test]
    fn full_ratio_keeps_whole_frame() {
        let luma = crop_subtitle_band(&striped(4, 10), 1.0).unwrap();
        assert_eq!(luma.height(), 10);
        assert_eq!(luma.data()[0], 0);
    }

    #[test]
    fn invalid_ratio_is_rejected() {
        let err = crop_subtitle_band(&striped(4, 10), 0.0).unwrap_err();
        assert!(matches!(err, VideoError::Frame(_)));
    }
}
