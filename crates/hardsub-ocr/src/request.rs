use hardsub_types::{LumaFrame, OcrRegion};

use crate::plane::LumaPlane;

/// One OCR call: a luma plane, the pixel regions to read from it and, when
/// known, the sampled frame the plane was cut from.
#[derive(Debug)]
pub struct OcrRequest<'a> {
    plane: LumaPlane<'a>,
    regions: &'a [OcrRegion],
    frame_index: Option<u64>,
}

impl<'a> OcrRequest<'a> {
    pub fn new(plane: LumaPlane<'a>, regions: &'a [OcrRegion]) -> Self {
        Self {
            plane,
            regions,
            frame_index: None,
        }
    }

    /// Reads `regions` of `frame`, tagging the request with the frame's index.
    pub fn for_frame(frame: &'a LumaFrame, regions: &'a [OcrRegion]) -> Self {
        Self {
            plane: LumaPlane::from_frame(frame),
            regions,
            frame_index: frame.frame_index(),
        }
    }

    pub fn plane(&self) -> &LumaPlane<'a> {
        &self.plane
    }

    pub fn regions(&self) -> &'a [OcrRegion] {
        self.regions
    }

    pub fn frame_index(&self) -> Option<u64> {
        self.frame_index
    }
}
