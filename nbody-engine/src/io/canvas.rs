// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! RGB raster stored as binary PPM (P6)

use crate::error::{Result, SimulationError};
use crate::integration::Bounds;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ColorType, ImageEncoder, Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// An RGB image whose size is the simulation box
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Create an all-black canvas
    ///
    /// # Errors
    ///
    /// Returns an error if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Bounds::new(width, height)?;
        Ok(Canvas {
            image: RgbImage::new(width, height),
        })
    }

    /// Read an image file, normally a P6 PPM
    ///
    /// The format is detected from the file contents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let image = image::io::Reader::open(path.as_ref())?
            .with_guessed_format()?
            .decode()?
            .to_rgb8();

        if image.width() == 0 || image.height() == 0 {
            return Err(SimulationError::InvalidBounds {
                width: image.width(),
                height: image.height(),
            });
        }
        Ok(Canvas { image })
    }

    /// Write the canvas as binary PPM, replacing any existing file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        let encoder = PnmEncoder::new(writer).with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary));
        encoder.write_image(
            self.image.as_raw(),
            self.image.width(),
            self.image.height(),
            ColorType::Rgb8,
        )?;
        Ok(())
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The simulation box this canvas covers
    pub fn bounds(&self) -> Result<Bounds> {
        Bounds::new(self.width(), self.height())
    }

    /// Colour of one pixel
    ///
    /// # Panics
    ///
    /// Panics if the pixel is outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.image.get_pixel(x, y).0
    }

    /// Set one pixel
    ///
    /// # Panics
    ///
    /// Panics if the pixel is outside the canvas.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        self.image.put_pixel(x, y, Rgb(rgb));
    }
}
