//! Ad template records and registration.

use crate::fingerprint::{Fingerprint, FINGERPRINT_VERSION};
use crate::image::{GrayImage, ImageView};
use crate::util::{AdSkipError, AdSkipResult};

mod id;
mod plan;
mod region;

pub use id::{IdClock, TemplateId};
pub use plan::TemplatePlan;
pub use region::{Rect, Region};

/// Skip duration used when the user does not pick one.
pub const DEFAULT_DURATION_MS: u64 = 3700;

/// Checks that a user-supplied duration is a positive number of milliseconds.
pub fn validate_duration(duration_ms: i64) -> AdSkipResult<u64> {
    if duration_ms <= 0 {
        return Err(AdSkipError::InvalidDuration(duration_ms));
    }
    Ok(duration_ms as u64)
}

/// Fingerprint stored next to the pixels it was computed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CachedFingerprint {
    pub version: u32,
    pub value: Fingerprint,
}

/// A registered ad overlay for one host.
#[derive(Clone, Debug, PartialEq)]
pub struct AdTemplate {
    pub id: TemplateId,
    pub host: String,
    /// Row-major grayscale pixels, `width * height` bytes.
    pub image_data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Source rectangle in the captured frame; `None` means the whole frame.
    pub region: Option<Region>,
    pub duration_ms: u64,
    pub fingerprint: Option<CachedFingerprint>,
}

impl AdTemplate {
    /// Borrows the stored pixels, checking them against the stored size.
    pub fn view(&self) -> AdSkipResult<ImageView<'_, u8>> {
        let needed = self
            .width
            .checked_mul(self.height)
            .ok_or(AdSkipError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        if self.image_data.len() != needed {
            return Err(AdSkipError::BufferLength {
                needed,
                got: self.image_data.len(),
            });
        }
        ImageView::from_slice(&self.image_data, self.width, self.height)
    }

    /// Checks the invariants every stored record must satisfy: non-empty
    /// host, positive duration, and pixels matching the stored size.
    pub fn validate(&self) -> AdSkipResult<()> {
        if self.host.is_empty() {
            return Err(AdSkipError::InvalidInput("host must not be empty"));
        }
        let duration = i64::try_from(self.duration_ms)
            .map_err(|_| AdSkipError::InvalidInput("duration out of range"))?;
        validate_duration(duration)?;
        self.view().map(|_| ())
    }

    /// Returns the cached fingerprint when it was produced by the current
    /// filter, otherwise recomputes it from the pixels.
    pub fn fingerprint(&self) -> AdSkipResult<Fingerprint> {
        match self.fingerprint {
            Some(cached) if cached.version == FINGERPRINT_VERSION => Ok(cached.value),
            _ => Fingerprint::from_view(self.view()?),
        }
    }
}

/// A template that has not been assigned an id yet.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateDraft {
    host: String,
    image: GrayImage,
    region: Option<Region>,
    duration_ms: u64,
}

impl TemplateDraft {
    /// Builds a draft from an already extracted grayscale image.
    pub fn new(
        host: impl Into<String>,
        image: GrayImage,
        region: Option<Region>,
        duration_ms: i64,
    ) -> AdSkipResult<Self> {
        let host = host.into();
        if host.is_empty() {
            return Err(AdSkipError::InvalidInput("host must not be empty"));
        }
        if let Some(region) = region {
            if region.rect.width != image.width() || region.rect.height != image.height() {
                return Err(AdSkipError::InvalidInput(
                    "region size differs from template image",
                ));
            }
        }
        Ok(Self {
            host,
            image,
            region,
            duration_ms: validate_duration(duration_ms)?,
        })
    }

    /// Cuts a template out of a captured frame ("mark ad").
    ///
    /// With `rect == None` the whole frame becomes the template and no region
    /// is recorded.
    pub fn from_frame(
        frame: ImageView<'_, u8>,
        host: impl Into<String>,
        rect: Option<Rect>,
        duration_ms: i64,
    ) -> AdSkipResult<Self> {
        let (image, region) = match rect {
            Some(rect) => {
                let region = Region::new(rect, frame.width(), frame.height())?;
                let crop = frame.crop(rect.x, rect.y, rect.width, rect.height)?;
                (GrayImage::from_view(crop)?, Some(region))
            }
            None => (GrayImage::from_view(frame)?, None),
        };
        Self::new(host, image, region, duration_ms)
    }

    /// Returns the host this draft belongs to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Assigns an id and computes the fingerprint cache.
    pub fn into_template(self, id: TemplateId) -> AdSkipResult<AdTemplate> {
        let value = Fingerprint::from_view(self.image.view())?;
        let width = self.image.width();
        let height = self.image.height();
        Ok(AdTemplate {
            id,
            host: self.host,
            image_data: self.image.into_pixels(),
            width,
            height,
            region: self.region,
            duration_ms: self.duration_ms,
            fingerprint: Some(CachedFingerprint {
                version: FINGERPRINT_VERSION,
                value,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_duration, AdTemplate, Rect, TemplateDraft, TemplateId};
    use crate::fingerprint::Fingerprint;
    use crate::image::{GrayImage, ImageView};
    use crate::template::CachedFingerprint;
    use crate::util::AdSkipError;

    #[test]
    fn durations_must_be_positive() {
        assert_eq!(validate_duration(3700).unwrap(), 3700);
        assert_eq!(
            validate_duration(0).err().unwrap(),
            AdSkipError::InvalidDuration(0)
        );
        assert_eq!(
            validate_duration(-5).err().unwrap(),
            AdSkipError::InvalidDuration(-5)
        );
    }

    #[test]
    fn from_frame_crops_and_records_region() {
        let data: Vec<u8> = (0u8..16).collect();
        let frame = ImageView::from_slice(&data, 4, 4).unwrap();
        let draft =
            TemplateDraft::from_frame(frame, "example.com", Some(Rect::new(2, 1, 2, 2)), 1000)
                .unwrap();
        let template = draft.into_template(TemplateId(1)).unwrap();
        assert_eq!(template.image_data, vec![6, 7, 10, 11]);
        let region = template.region.unwrap();
        assert_eq!((region.frame_width, region.frame_height), (4, 4));
    }

    #[test]
    fn empty_host_is_rejected() {
        let image = GrayImage::filled(2, 2, 0).unwrap();
        let err = TemplateDraft::new("", image, None, 10).err().unwrap();
        assert_eq!(err, AdSkipError::InvalidInput("host must not be empty"));
    }

    #[test]
    fn stale_fingerprint_cache_is_recomputed() {
        let image = GrayImage::new((0..64).collect(), 8, 8).unwrap();
        let mut template = TemplateDraft::new("a.test", image, None, 10)
            .unwrap()
            .into_template(TemplateId(1))
            .unwrap();
        let fresh = template.fingerprint().unwrap();
        template.fingerprint = Some(CachedFingerprint {
            version: 0,
            value: Fingerprint(0),
        });
        assert_eq!(template.fingerprint().unwrap(), fresh);
    }

    #[test]
    fn corrupt_pixels_fail_view() {
        let template = AdTemplate {
            id: TemplateId(1),
            host: "a.test".into(),
            image_data: vec![0; 3],
            width: 2,
            height: 2,
            region: None,
            duration_ms: 10,
            fingerprint: None,
        };
        assert_eq!(
            template.view().err().unwrap(),
            AdSkipError::BufferLength { needed: 4, got: 3 }
        );
        assert_eq!(
            template.validate().err().unwrap(),
            AdSkipError::BufferLength { needed: 4, got: 3 }
        );
    }

    #[test]
    fn zero_duration_record_is_invalid() {
        let image = GrayImage::filled(2, 2, 0).unwrap();
        let mut template = TemplateDraft::new("a.test", image, None, 5)
            .unwrap()
            .into_template(TemplateId(1))
            .unwrap();
        assert!(template.validate().is_ok());
        template.duration_ms = 0;
        assert_eq!(
            template.validate().err().unwrap(),
            AdSkipError::InvalidDuration(0)
        );
    }
}
