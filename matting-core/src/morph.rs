//! Binary morphology helpers shared by [`crate::trimap`] and
//! [`crate::laplacian`].
//!
//! These operate on flat `Vec<bool>` rasters rather than pulling in an
//! image-processing crate, since the structuring elements needed here
//! (a square of ones, and a small disk) are simple enough to hand-roll
//! and the rest of the crate already treats images as flat `f64`/`bool`
//! buffers with no external image type.

/// Border convention for morphological operations: what value a pixel
/// outside the raster is assumed to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderValue {
    /// Pixels outside the raster count as `false`.
    Zero,
    /// Pixels outside the raster count as `true`.
    ///
    /// Used for background erosion so that background regions touching
    /// the image border are not falsely shrunk (`scipy.ndimage
    /// .binary_erosion(..., border_value=1)` in the reference
    /// implementation).
    One,
}

/// Binary erosion with a `size x size` square structuring element of all
/// ones, centered (for odd `size`) or offset toward the top-left (for
/// even `size`, matching `numpy.ones((size,size))` with `scipy`'s default
/// origin).
pub fn erode_square(
    mask: &[bool],
    height: usize,
    width: usize,
    size: usize,
    border: BorderValue,
) -> Vec<bool> {
    if size == 0 {
        return mask.to_vec();
    }
    let before = size / 2;
    let after = size - before - 1;
    let outside = border == BorderValue::One;
    let mut out = vec![false; mask.len()];
    for y in 0..height {
        for x in 0..width {
            let mut all_set = true;
            'scan: for dy in -(before as isize)..=(after as isize) {
                let ny = y as isize + dy;
                for dx in -(before as isize)..=(after as isize) {
                    let nx = x as isize + dx;
                    let set = if ny < 0 || nx < 0 || ny >= height as isize || nx >= width as isize
                    {
                        outside
                    } else {
                        mask[ny as usize * width + nx as usize]
                    };
                    if !set {
                        all_set = false;
                        break 'scan;
                    }
                }
            }
            out[y * width + x] = all_set;
        }
    }
    out
}

/// Binary dilation with a `size x size` square structuring element of all
/// ones.
pub fn dilate_square(mask: &[bool], height: usize, width: usize, size: usize) -> Vec<bool> {
    if size == 0 {
        return mask.to_vec();
    }
    let before = size / 2;
    let after = size - before - 1;
    let mut out = vec![false; mask.len()];
    for y in 0..height {
        for x in 0..width {
            let mut any_set = false;
            'scan: for dy in -(before as isize)..=(after as isize) {
                let ny = y as isize + dy;
                if ny < 0 || ny >= height as isize {
                    continue;
                }
                for dx in -(before as isize)..=(after as isize) {
                    let nx = x as isize + dx;
                    if nx < 0 || nx >= width as isize {
                        continue;
                    }
                    if mask[ny as usize * width + nx as usize] {
                        any_set = true;
                        break 'scan;
                    }
                }
            }
            out[y * width + x] = any_set;
        }
    }
    out
}

/// Binary dilation with an elliptical (disk) structuring element of the
/// given radius, approximating `cv2.getStructuringElement(MORPH_ELLIPSE,
/// ...)` for the square case (radius equal in both axes): a pixel is
/// included in the structuring element iff it lies within `radius` under
/// the Euclidean metric.
pub fn dilate_disk(mask: &[bool], height: usize, width: usize, radius: usize) -> Vec<bool> {
    if radius == 0 {
        return mask.to_vec();
    }
    let r = radius as isize;
    let r2 = (radius * radius) as isize;
    let mut out = vec![false; mask.len()];
    for y in 0..height {
        for x in 0..width {
            let mut any_set = false;
            'scan: for dy in -r..=r {
                let ny = y as isize + dy;
                if ny < 0 || ny >= height as isize {
                    continue;
                }
                for dx in -r..=r {
                    if dx * dx + dy * dy > r2 {
                        continue;
                    }
                    let nx = x as isize + dx;
                    if nx < 0 || nx >= width as isize {
                        continue;
                    }
                    if mask[ny as usize * width + nx as usize] {
                        any_set = true;
                        break 'scan;
                    }
                }
            }
            out[y * width + x] = any_set;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&str]) -> (Vec<bool>, usize, usize) {
        let height = rows.len();
        let width = rows[0].len();
        let mut data = Vec::with_capacity(height * width);
        for row in rows {
            for c in row.chars() {
                data.push(c == '#');
            }
        }
        (data, height, width)
    }

    #[test]
    fn erosion_shrinks_a_solid_block() {
        let (mask, h, w) = grid(&["....", ".##.", ".##.", "...."]);
        let eroded = erode_square(&mask, h, w, 3, BorderValue::Zero);
        assert!(eroded.iter().all(|&v| !v), "2x2 block eroded by 3x3 vanishes");
    }

    #[test]
    fn erosion_border_one_keeps_background_touching_edge() {
        // All background; border_value=1 means the whole raster survives
        // erosion since every neighborhood (real or virtual) is all-true.
        let mask = vec![true; 16];
        let eroded = erode_square(&mask, 4, 4, 3, BorderValue::One);
        assert!(eroded.iter().all(|&v| v));
    }

    #[test]
    fn erosion_border_zero_shrinks_background_touching_edge() {
        let mask = vec![true; 16];
        let eroded = erode_square(&mask, 4, 4, 3, BorderValue::Zero);
        // corners/edges lose coverage because the virtual neighbors are false.
        assert!(!eroded.iter().all(|&v| v));
        assert!(eroded[5] && eroded[6] && eroded[9] && eroded[10]);
    }

    #[test]
    fn dilation_grows_a_single_pixel() {
        let mut mask = vec![false; 25];
        mask[12] = true; // center of 5x5
        let dilated = dilate_square(&mask, 5, 5, 3);
        assert!(dilated[6] && dilated[7] && dilated[8]);
        assert!(dilated[11] && dilated[12] && dilated[13]);
        assert!(dilated[16] && dilated[17] && dilated[18]);
        assert!(!dilated[0]);
    }

    #[test]
    fn disk_dilation_radius_one_matches_4_neighborhood_plus_center() {
        let mut mask = vec![false; 25];
        mask[12] = true;
        let dilated = dilate_disk(&mask, 5, 5, 1);
        assert!(dilated[12] && dilated[7] && dilated[17] && dilated[11] && dilated[13]);
        assert!(!dilated[6], "diagonal neighbor outside radius-1 disk");
    }
}
