use image::{GrayImage, Luma};

use crate::preprocessing::domain::background_model::{
    check_geometry, BackgroundModel, PreprocessError,
};

/// Tunables of the adaptive Gaussian mixture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mog2Params {
    /// Frames over which the learning rate settles.
    pub history: u32,
    pub max_modes: usize,
    /// Squared Mahalanobis distance under which a sample is background.
    pub var_threshold: f32,
    /// Squared Mahalanobis distance under which a sample updates a mode.
    pub var_threshold_gen: f32,
    /// Share of total weight the background modes cover.
    pub background_ratio: f32,
    pub var_init: f32,
    pub var_min: f32,
    pub var_max: f32,
    /// Complexity reduction prior; weights decay by `alpha * ct` per frame.
    pub complexity_reduction: f32,
}

impl Default for Mog2Params {
    fn default() -> Self {
        Self {
            history: 500,
            max_modes: 5,
            var_threshold: 16.0,
            var_threshold_gen: 9.0,
            background_ratio: 0.9,
            var_init: 15.0,
            var_min: 4.0,
            var_max: 75.0,
            complexity_reduction: 0.05,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Mode {
    weight: f32,
    mean: f32,
    variance: f32,
}

/// Per-pixel adaptive mixture-of-Gaussians background model.
///
/// Each pixel holds up to `max_modes` Gaussians sorted by weight. A sample
/// is background when it falls close enough to one of the heaviest modes
/// whose cumulative weight stays under `background_ratio`. No shadow
/// detection: the mask is strictly 0 or 255.
pub struct Mog2BackgroundModel {
    params: Mog2Params,
    width: u32,
    height: u32,
    frames_seen: u32,
    modes: Vec<Mode>,
    modes_used: Vec<u8>,
}

impl Mog2BackgroundModel {
    pub fn new() -> Self {
        Self::with_params(Mog2Params::default())
    }

    pub fn with_params(params: Mog2Params) -> Self {
        Self {
            params,
            width: 0,
            height: 0,
            frames_seen: 0,
            modes: Vec::new(),
            modes_used: Vec::new(),
        }
    }

    fn initialize(&mut self, width: u32, height: u32) {
        let pixels = width as usize * height as usize;
        self.width = width;
        self.height = height;
        self.modes = vec![Mode::default(); pixels * self.params.max_modes];
        self.modes_used = vec![0; pixels];
        log::debug!("MOG2 background model initialized at {width}x{height}");
    }

    fn learning_rate(&self) -> f32 {
        let n = self.frames_seen.saturating_mul(2).min(self.params.history).max(1);
        1.0 / n as f32
    }

    /// Updates one pixel's mixture and reports whether the sample is background.
    fn update_pixel(&self, gmm: &mut [Mode], used: &mut u8, value: f32, alpha: f32) -> bool {
        let p = &self.params;
        let alpha1 = 1.0 - alpha;
        let prune = -alpha * p.complexity_reduction;

        let mut fits = false;
        let mut background = false;
        let mut total_weight = 0.0f32;
        let mut n = *used as usize;

        let mut mode = 0;
        while mode < n {
            let mut weight = alpha1 * gmm[mode].weight + prune;
            let mut swaps = 0;

            if !fits {
                let var = gmm[mode].variance;
                let diff = gmm[mode].mean - value;
                let dist2 = diff * diff;

                if total_weight < p.background_ratio && dist2 < p.var_threshold * var {
                    background = true;
                }

                if dist2 < p.var_threshold_gen * var {
                    fits = true;
                    weight += alpha;
                    let k = alpha / weight;
                    gmm[mode].mean -= k * diff;
                    gmm[mode].variance = (var + k * (dist2 - var)).clamp(p.var_min, p.var_max);

                    // Only this weight grew, so only this mode moves up.
                    let mut i = mode;
                    while i > 0 && weight >= gmm[i - 1].weight {
                        gmm.swap(i, i - 1);
                        swaps += 1;
                        i -= 1;
                    }
                }
            }

            if weight < -prune {
                weight = 0.0;
                n -= 1;
            }
            gmm[mode - swaps].weight = weight;
            total_weight += weight;
            mode += 1;
        }

        if total_weight > 0.0 {
            let norm = 1.0 / total_weight;
            for m in gmm.iter_mut().take(n) {
                m.weight *= norm;
            }
        }

        if !fits {
            let slot = if n == p.max_modes {
                p.max_modes - 1
            } else {
                n += 1;
                n - 1
            };
            if n == 1 {
                gmm[slot].weight = 1.0;
            } else {
                gmm[slot].weight = alpha;
                for m in gmm.iter_mut().take(n - 1) {
                    m.weight *= alpha1;
                }
            }
            gmm[slot].mean = value;
            gmm[slot].variance = p.var_init;

            let mut i = n - 1;
            while i > 0 && alpha >= gmm[i - 1].weight {
                gmm.swap(i, i - 1);
                i -= 1;
            }
        }

        *used = n as u8;
        background
    }
}

impl Default for Mog2BackgroundModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundModel for Mog2BackgroundModel {
    fn apply(&mut self, frame: &GrayImage) -> Result<GrayImage, PreprocessError> {
        if self.frames_seen == 0 {
            self.initialize(frame.width(), frame.height());
        } else {
            check_geometry(frame, self.width, self.height)?;
        }
        self.frames_seen += 1;
        let alpha = self.learning_rate();

        let k = self.params.max_modes;
        let mut modes = std::mem::take(&mut self.modes);
        let mut used = std::mem::take(&mut self.modes_used);

        let mut mask = GrayImage::new(frame.width(), frame.height());
        for (i, (pixel, out)) in frame.pixels().zip(mask.pixels_mut()).enumerate() {
            let gmm = &mut modes[i * k..(i + 1) * k];
            let background = self.update_pixel(gmm, &mut used[i], pixel[0] as f32, alpha);
            *out = Luma([if background { 0 } else { 255 }]);
        }

        self.modes = modes;
        self.modes_used = used;
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat(width: u32, height: u32, value: u8) -> GrayImage {
        GrayImage::from_pixel(width, height, Luma([value]))
    }

    fn with_square(mut img: GrayImage, x0: u32, y0: u32, size: u32, value: u8) -> GrayImage {
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                img.put_pixel(x, y, Luma([value]));
            }
        }
        img
    }

    fn foreground_count(mask: &GrayImage) -> usize {
        mask.pixels().filter(|p| p[0] == 255).count()
    }

    #[test]
    fn test_first_frame_is_all_foreground() {
        let mut model = Mog2BackgroundModel::new();
        let mask = model.apply(&flat(8, 6, 50)).unwrap();
        assert_eq!(foreground_count(&mask), 48);
    }

    #[test]
    fn test_static_scene_becomes_background() {
        let mut model = Mog2BackgroundModel::new();
        let mut mask = GrayImage::new(0, 0);
        for _ in 0..5 {
            mask = model.apply(&flat(8, 6, 50)).unwrap();
        }
        assert_eq!(foreground_count(&mask), 0);
    }

    #[test]
    fn test_new_object_is_foreground() {
        let mut model = Mog2BackgroundModel::new();
        for _ in 0..10 {
            model.apply(&flat(20, 20, 40)).unwrap();
        }
        let mask = model
            .apply(&with_square(flat(20, 20, 40), 5, 5, 4, 220))
            .unwrap();
        assert_eq!(foreground_count(&mask), 16);
        assert_eq!(mask.get_pixel(6, 6)[0], 255);
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_small_noise_stays_background() {
        let mut model = Mog2BackgroundModel::new();
        for _ in 0..10 {
            model.apply(&flat(10, 10, 100)).unwrap();
        }
        // Variance never drops below var_min = 4, so |diff| < 8 is background.
        let mask = model.apply(&flat(10, 10, 105)).unwrap();
        assert_eq!(foreground_count(&mask), 0);
    }

    #[test]
    fn test_geometry_change_is_error() {
        let mut model = Mog2BackgroundModel::new();
        model.apply(&flat(8, 8, 0)).unwrap();
        let err = model.apply(&flat(8, 9, 0)).unwrap_err();
        assert_eq!(
            err,
            PreprocessError::GeometryMismatch {
                width: 8,
                height: 9,
                expected_width: 8,
                expected_height: 8
            }
        );
    }

    #[test]
    fn test_learning_rate_schedule() {
        let mut model = Mog2BackgroundModel::new();
        model.frames_seen = 1;
        assert_relative_eq!(model.learning_rate(), 0.5);
        model.frames_seen = 10;
        assert_relative_eq!(model.learning_rate(), 0.05);
        model.frames_seen = 10_000;
        assert_relative_eq!(model.learning_rate(), 1.0 / 500.0);
    }

    #[test]
    fn test_weights_stay_normalized() {
        let mut model = Mog2BackgroundModel::new();
        for v in [10u8, 200, 10, 90, 200, 10] {
            model.apply(&flat(1, 1, v)).unwrap();
        }
        let used = model.modes_used[0] as usize;
        assert!(used >= 1 && used <= model.params.max_modes);
        let total: f32 = model.modes[..used].iter().map(|m| m.weight).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-4);
        for pair in model.modes[..used].windows(2) {
            assert!(pair[0].weight >= pair[1].weight);
        }
    }

    #[test]
    fn test_departed_object_fades_back_to_background() {
        let mut model = Mog2BackgroundModel::new();
        for _ in 0..10 {
            model.apply(&flat(6, 6, 30)).unwrap();
        }
        model.apply(&with_square(flat(6, 6, 30), 1, 1, 2, 250)).unwrap();
        let mask = model.apply(&flat(6, 6, 30)).unwrap();
        assert_eq!(foreground_count(&mask), 0);
    }
}
