//! Background image loading.

use crate::store::BoxFuture;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while loading the background image.
#[derive(Debug, Error, PartialEq)]
pub enum ImageLoadError {
    #[error("Image not found: {0}")]
    NotFound(String),
    #[error("Image decode failed: {0}")]
    Decode(String),
}

/// A decoded image ready to be placed on a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundImage {
    pub src: String,
    pub width: u32,
    pub height: u32,
}

/// Asynchronous image source. The load completes once, with the image or an error.
#[cfg(not(target_arch = "wasm32"))]
pub trait ImageLoader: Send + Sync {
    fn load(&self, src: &str) -> BoxFuture<'_, Result<BackgroundImage, ImageLoadError>>;
}

/// Asynchronous image source (WASM version without Send + Sync).
#[cfg(target_arch = "wasm32")]
pub trait ImageLoader {
    fn load(&self, src: &str) -> BoxFuture<'_, Result<BackgroundImage, ImageLoadError>>;
}

/// Loader backed by a fixed table of known images.
#[derive(Debug, Default)]
pub struct StaticImageLoader {
    images: HashMap<String, (u32, u32)>,
}

impl StaticImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under `src`.
    pub fn with_image(mut self, src: impl Into<String>, width: u32, height: u32) -> Self {
        self.images.insert(src.into(), (width, height));
        self
    }
}

impl ImageLoader for StaticImageLoader {
    fn load(&self, src: &str) -> BoxFuture<'_, Result<BackgroundImage, ImageLoadError>> {
        let src = src.to_string();
        Box::pin(async move {
            let (width, height) = *self
                .images
                .get(&src)
                .ok_or_else(|| ImageLoadError::NotFound(src.clone()))?;
            Ok(BackgroundImage { src, width, height })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_image_loads() {
        let loader = StaticImageLoader::new().with_image("/bg.png", 640, 480);
        let image = pollster::block_on(loader.load("/bg.png")).unwrap();
        assert_eq!((image.width, image.height), (640, 480));
        assert_eq!(image.src, "/bg.png");
    }

    #[test]
    fn test_unknown_image_fails() {
        let loader = StaticImageLoader::new();
        let result = pollster::block_on(loader.load("/missing.png"));
        assert_eq!(result, Err(ImageLoadError::NotFound("/missing.png".into())));
    }
}
