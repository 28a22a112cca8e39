//! Template plan precomputation for correlation matching.

use crate::image::ImageView;
use crate::util::AdSkipResult;

/// Contiguous template pixels plus their energy `Σ T²`.
pub struct TemplatePlan {
    width: usize,
    height: usize,
    data: Vec<f64>,
    energy: f64,
}

impl TemplatePlan {
    /// Builds a plan from a template view.
    pub fn from_view(tpl: ImageView<'_, u8>) -> AdSkipResult<Self> {
        let mut data = Vec::with_capacity(tpl.width() * tpl.height());
        let mut energy = 0.0f64;
        for row in tpl.rows() {
            for &value in row {
                let v = value as f64;
                energy += v * v;
                data.push(v);
            }
        }

        Ok(Self {
            width: tpl.width(),
            height: tpl.height(),
            data,
            energy,
        })
    }

    /// Returns the template width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the template height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the template pixels in row-major order.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Returns `Σ T²`; zero for an all-black template.
    pub fn energy(&self) -> f64 {
        self.energy
    }
}
