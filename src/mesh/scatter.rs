use glam::Vec3;
use rand::Rng;

/// Uniform point in the cube `[-half_extent, half_extent]^3`, each axis drawn
/// independently. Float range sampling carries no modulo bias.
pub fn random_point_in_cube<R: Rng + ?Sized>(rng: &mut R, half_extent: f32) -> Vec3 {
    let h = half_extent.abs();
    if h == 0.0 {
        return Vec3::ZERO;
    }
    Vec3::new(
        rng.random_range(-h..=h),
        rng.random_range(-h..=h),
        rng.random_range(-h..=h),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_axis_means_near_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let h = 50.0;
        let samples = 10_000;
        let sum = (0..samples).fold(Vec3::ZERO, |acc, _| acc + random_point_in_cube(&mut rng, h));
        let mean = sum / samples as f32;

        // within 5% of the half extent
        assert!(mean.x.abs() < 0.05 * h, "x mean {}", mean.x);
        assert!(mean.y.abs() < 0.05 * h, "y mean {}", mean.y);
        assert!(mean.z.abs() < 0.05 * h, "z mean {}", mean.z);
    }

    #[test]
    fn test_points_stay_inside_cube() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..5_000 {
            let p = random_point_in_cube(&mut rng, 50.0);
            assert!(p.abs().max_element() <= 50.0);
        }
    }

    #[test]
    fn test_zero_extent_is_origin() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_point_in_cube(&mut rng, 0.0), Vec3::ZERO);
    }
}
