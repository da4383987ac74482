//! Raster drawing primitives.

use ndarray::Array3;

/// Fill a disc of `radius` pixels around `(cx, cy)` with `value` on every
/// channel. Pixels with `dx² + dy² <= radius²` are covered; the disc is
/// clipped to the image bounds.
pub fn fill_circle(canvas: &mut Array3<f32>, cx: usize, cy: usize, radius: usize, value: f32) {
    let (height, width, channels) = canvas.dim();
    let r = radius as isize;
    let r_sq = r * r;

    for dy in -r..=r {
        let y = cy as isize + dy;
        if y < 0 || y >= height as isize {
            continue;
        }
        for dx in -r..=r {
            let x = cx as isize + dx;
            if x < 0 || x >= width as isize || dx * dx + dy * dy > r_sq {
                continue;
            }
            for c in 0..channels {
                canvas[[y as usize, x as usize, c]] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_one_is_plus_shape() {
        let mut canvas = Array3::<f32>::zeros((5, 5, 3));
        fill_circle(&mut canvas, 2, 2, 1, 250.0);

        let covered: usize = canvas.iter().filter(|&&v| v == 250.0).count();
        assert_eq!(covered, 5 * 3);
        assert_eq!(canvas[[1, 1, 0]], 0.0);
        assert_eq!(canvas[[1, 2, 2]], 250.0);
    }

    #[test]
    fn test_radius_two_pixel_count() {
        let mut canvas = Array3::<f32>::zeros((9, 9, 1));
        fill_circle(&mut canvas, 4, 4, 2, 1.0);
        assert_eq!(canvas.sum() as usize, 13);
    }

    #[test]
    fn test_clipped_at_corner() {
        let mut canvas = Array3::<f32>::zeros((3, 3, 1));
        fill_circle(&mut canvas, 0, 0, 2, 1.0);
        // (0,0) (0,1) (0,2) (1,0) (1,1) (2,0)
        assert_eq!(canvas.sum() as usize, 6);
    }
}
