//! Image preprocessing for OCR.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::error::OcrError;
use crate::models::config::PreprocessConfig;
use crate::models::receipt::ExtractionMode;

/// Noise reduction applied between grayscale conversion and thresholding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DenoiseFilter {
    /// Edge-preserving bilateral filter.
    Bilateral {
        diameter: u32,
        sigma_color: f32,
        sigma_space: f32,
    },
    /// Square Gaussian blur with automatic sigma.
    Gaussian { kernel: u32 },
}

/// Image preprocessor for the OCR pipeline.
///
/// Grayscale, then denoise, then adaptive Gaussian threshold. The output is a
/// binary single-channel image.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: PreprocessConfig,
    mode: ExtractionMode,
}

impl ImagePreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            config: PreprocessConfig::default(),
            mode: ExtractionMode::Keyword,
        }
    }

    /// Set filter and threshold parameters.
    pub fn with_config(mut self, config: PreprocessConfig) -> Self {
        self.config = config;
        self
    }

    /// Select the denoise filter through the extraction mode.
    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Filter used for the current mode.
    pub fn denoise_filter(&self) -> DenoiseFilter {
        match self.mode {
            ExtractionMode::Keyword => DenoiseFilter::Bilateral {
                diameter: self.config.bilateral_diameter,
                sigma_color: self.config.bilateral_sigma_color,
                sigma_space: self.config.bilateral_sigma_space,
            },
            ExtractionMode::Simple => DenoiseFilter::Gaussian {
                kernel: self.config.gaussian_kernel,
            },
        }
    }

    /// Run the full pipeline on a decoded image.
    pub fn process(&self, image: &DynamicImage) -> Result<GrayImage, OcrError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OcrError::Preprocessing("image has no pixels".to_string()));
        }
        self.validate()?;

        debug!("Preprocessing {}x{} image ({} mode)", width, height, self.mode);

        let gray = image.to_luma8();
        let denoised = match self.denoise_filter() {
            DenoiseFilter::Bilateral {
                diameter,
                sigma_color,
                sigma_space,
            } => bilateral_filter(&gray, diameter, sigma_color, sigma_space),
            DenoiseFilter::Gaussian { kernel } => gaussian_blur(&gray, kernel),
        };

        Ok(adaptive_threshold(
            &denoised,
            self.config.threshold_block_size,
            self.config.threshold_offset,
        ))
    }

    fn validate(&self) -> Result<(), OcrError> {
        let block = self.config.threshold_block_size;
        if block < 3 || block % 2 == 0 {
            return Err(OcrError::Preprocessing(format!(
                "threshold block size must be odd and >= 3, got {}",
                block
            )));
        }
        match self.denoise_filter() {
            DenoiseFilter::Gaussian { kernel } if kernel == 0 || kernel % 2 == 0 => {
                Err(OcrError::Preprocessing(format!(
                    "gaussian kernel must be odd, got {}",
                    kernel
                )))
            }
            DenoiseFilter::Bilateral {
                sigma_color,
                sigma_space,
                ..
            } if sigma_color <= 0.0 || sigma_space <= 0.0 => Err(OcrError::Preprocessing(
                "bilateral sigmas must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Sigma used for a Gaussian kernel of `size` when none is given.
fn auto_sigma(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = auto_sigma(size);
    let radius = (size / 2) as i32;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable convolution with replicated borders.
fn convolve_separable(src: &[f32], width: usize, height: usize, kernel: &[f32]) -> Vec<f32> {
    let radius = (kernel.len() / 2) as isize;
    let max_x = width as isize - 1;
    let max_y = height as isize - 1;

    let mut horizontal = vec![0.0f32; src.len()];
    for y in 0..height {
        let row = y * width;
        for x in 0..width {
            let mut acc = 0.0;
            for (i, k) in kernel.iter().enumerate() {
                let sx = (x as isize + i as isize - radius).clamp(0, max_x) as usize;
                acc += k * src[row + sx];
            }
            horizontal[row + x] = acc;
        }
    }

    let mut out = vec![0.0f32; src.len()];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            for (i, k) in kernel.iter().enumerate() {
                let sy = (y as isize + i as isize - radius).clamp(0, max_y) as usize;
                acc += k * horizontal[sy * width + x];
            }
            out[y * width + x] = acc;
        }
    }
    out
}

fn to_f32(image: &GrayImage) -> Vec<f32> {
    image.as_raw().iter().map(|&p| p as f32).collect()
}

pub(crate) fn gaussian_blur(image: &GrayImage, kernel_size: u32) -> GrayImage {
    let (width, height) = image.dimensions();
    let kernel = gaussian_kernel(kernel_size);
    let blurred = convolve_separable(&to_f32(image), width as usize, height as usize, &kernel);

    let pixels = blurred
        .into_iter()
        .map(|v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| image.clone())
}

pub(crate) fn bilateral_filter(
    image: &GrayImage,
    diameter: u32,
    sigma_color: f32,
    sigma_space: f32,
) -> GrayImage {
    let (width, height) = image.dimensions();
    let radius = (diameter / 2) as i32;
    if radius == 0 {
        return image.clone();
    }

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    let color_weight: Vec<f32> = (0..256)
        .map(|d| ((d * d) as f32 * color_coeff).exp())
        .collect();

    // Circular neighbourhood.
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let r2 = dx * dx + dy * dy;
            if r2 > radius * radius {
                continue;
            }
            offsets.push((dx, dy, (r2 as f32 * space_coeff).exp()));
        }
    }

    let max_x = width as i32 - 1;
    let max_y = height as i32 - 1;
    let mut result = GrayImage::new(width, height);

    for y in 0..height {
        for x in 0..width {
            let center = image.get_pixel(x, y)[0] as i32;
            let mut sum = 0.0f32;
            let mut weight_sum = 0.0f32;

            for &(dx, dy, space_weight) in &offsets {
                let sx = (x as i32 + dx).clamp(0, max_x) as u32;
                let sy = (y as i32 + dy).clamp(0, max_y) as u32;
                let value = image.get_pixel(sx, sy)[0] as i32;
                let weight = space_weight * color_weight[(value - center).unsigned_abs() as usize];
                sum += weight * value as f32;
                weight_sum += weight;
            }

            let output = (sum / weight_sum).round().clamp(0.0, 255.0) as u8;
            result.put_pixel(x, y, Luma([output]));
        }
    }

    result
}

/// Binarize against a Gaussian-weighted local mean minus `offset`.
pub(crate) fn adaptive_threshold(image: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let kernel = gaussian_kernel(block_size);
    let source = to_f32(image);
    let local_mean = convolve_separable(&source, width as usize, height as usize, &kernel);

    let pixels = source
        .iter()
        .zip(local_mean.iter())
        .map(|(&value, &mean)| if value > mean - offset { 255u8 } else { 0u8 })
        .collect();
    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| GrayImage::new(width, height))
}
