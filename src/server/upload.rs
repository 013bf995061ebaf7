//! Multipart form collection

use crate::{
    error::{Result, StudioError},
    types::{BackgroundColor, BackgroundOptions, BlurIntensity, ImageInput},
};
use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use std::collections::HashMap;

/// All fields of one upload, held in memory
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, Vec<u8>>,
}

impl UploadForm {
    /// Drain `payload`, rejecting uploads larger than `max_bytes` in total
    ///
    /// # Errors
    /// - `Validation` for malformed multipart bodies or oversized uploads
    pub async fn read(mut payload: Multipart, max_bytes: usize) -> Result<Self> {
        let mut fields = HashMap::new();
        let mut total = 0usize;

        while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            let mut data = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(malformed)?;
                total += chunk.len();
                if total > max_bytes {
                    return Err(StudioError::validation(format!(
                        "Upload is larger than the {} byte limit",
                        max_bytes
                    )));
                }
                data.extend_from_slice(&chunk);
            }
            fields.insert(name, data);
        }

        Ok(Self { fields })
    }

    /// Build a form directly from field values
    #[must_use]
    pub fn from_fields<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<u8>)>,
        K: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Decode the file field `name`; an absent or empty field is `None`
    ///
    /// # Errors
    /// - `Validation` if the field holds bytes that are not an image
    pub fn image(&self, name: &str) -> Result<Option<ImageInput>> {
        match self.fields.get(name) {
            Some(bytes) if !bytes.is_empty() => ImageInput::from_bytes(bytes.clone()).map(Some),
            _ => Ok(None),
        }
    }

    /// Decoded image in field `name`, which must be present
    ///
    /// # Errors
    /// - `Validation` with the missing image message if the field is absent or empty
    /// - `Validation` if the bytes are not a decodable image
    pub fn required_image(&self, name: &str) -> Result<ImageInput> {
        self.image(name)?.ok_or_else(StudioError::missing_image)
    }

    /// Trimmed text value of `name`; blank values are `None`
    #[must_use]
    pub fn text(&self, name: &str) -> Option<String> {
        let value = self.fields.get(name)?;
        let value = String::from_utf8_lossy(value).trim().to_string();
        (!value.is_empty()).then_some(value)
    }

    /// `background_image` and `background_color`, both optional
    ///
    /// # Errors
    /// - `Validation` for an undecodable image or a malformed color
    pub fn background_options(&self) -> Result<BackgroundOptions> {
        let mut options = BackgroundOptions::none();
        if let Some(background) = self.image("background_image")? {
            options = options.with_image(background.image().clone());
        }
        if let Some(color) = self.text("background_color") {
            options = options.with_color(BackgroundColor::from_hex(&color)?);
        }
        Ok(options)
    }

    /// `intensity`, defaulting when absent
    ///
    /// # Errors
    /// - `Validation` if the value is not a number
    pub fn intensity(&self) -> Result<BlurIntensity> {
        match self.text("intensity") {
            Some(value) => value.parse(),
            None => Ok(BlurIntensity::default()),
        }
    }
}

fn malformed(err: actix_multipart::MultipartError) -> StudioError {
    StudioError::validation(format!("Malformed upload: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat};

    fn png() -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(3, 3)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_empty_file_field_is_no_image() {
        let form = UploadForm::from_fields([("image", Vec::new())]);
        assert!(form.image("image").unwrap().is_none());
        assert!(form.image("missing").unwrap().is_none());

        let err = form.required_image("image").unwrap_err();
        assert_eq!(err.to_string(), crate::error::MISSING_IMAGE_MESSAGE);
    }

    #[test]
    fn test_background_options() {
        let form = UploadForm::from_fields([
            ("background_image", png()),
            ("background_color", b" #00ff00 ".to_vec()),
        ]);
        let options = form.background_options().unwrap();
        assert!(options.image.is_some());
        assert_eq!(options.color, Some(BackgroundColor::new(0, 255, 0)));

        let form = UploadForm::from_fields([("background_color", b"green".to_vec())]);
        assert!(matches!(
            form.background_options(),
            Err(StudioError::Validation(_))
        ));
    }

    #[test]
    fn test_intensity_defaults_and_clamps() {
        let form = UploadForm::default();
        assert_eq!(form.intensity().unwrap(), BlurIntensity::default());

        let form = UploadForm::from_fields([("intensity", b"3.0".to_vec())]);
        assert_eq!(form.intensity().unwrap().value(), BlurIntensity::MAX);

        let form = UploadForm::from_fields([("intensity", b"strong".to_vec())]);
        assert!(form.intensity().is_err());
    }
}
