use bb_core::ImageView;
use serde::{Deserialize, Serialize};

/// Which image axis indexes the sensor lines of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileAxis {
    /// One value per image row, averaged across the width.
    #[default]
    Rows,
    /// One value per image column, averaged across the height.
    Cols,
}

impl ProfileAxis {
    /// Number of profile samples a frame of this shape produces.
    pub fn line_count<T>(self, img: &ImageView<'_, T>) -> usize {
        match self {
            ProfileAxis::Rows => img.height(),
            ProfileAxis::Cols => img.width(),
        }
    }
}

/// Reduces a frame to one mean intensity per sensor line.
///
/// Returns `None` for a zero-area frame; callers treat that as a dropped
/// frame.
pub fn extract_profile_u8(img: &ImageView<'_, u8>, axis: ProfileAxis) -> Option<Vec<f64>> {
    if img.is_empty() {
        return None;
    }

    let profile = match axis {
        ProfileAxis::Rows => {
            let inv = 1.0 / img.width() as f64;
            img.rows()
                .map(|row| row.iter().map(|&px| u64::from(px)).sum::<u64>() as f64 * inv)
                .collect()
        }
        ProfileAxis::Cols => {
            let mut sums = vec![0u64; img.width()];
            for row in img.rows() {
                for (acc, &px) in sums.iter_mut().zip(row) {
                    *acc += u64::from(px);
                }
            }
            let inv = 1.0 / img.height() as f64;
            sums.into_iter().map(|s| s as f64 * inv).collect()
        }
    };

    Some(profile)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use bb_core::{Image, ImageView};

    use super::{ProfileAxis, extract_profile_u8};

    #[test]
    fn row_means_one_value_per_line() {
        let img = Image::from_vec(3, 2, vec![0u8, 3, 6, 255, 255, 0]).expect("valid image");
        let profile = extract_profile_u8(&img.as_view(), ProfileAxis::Rows).expect("non-empty");

        assert_eq!(profile.len(), 2);
        assert_abs_diff_eq!(profile[0], 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(profile[1], 170.0, epsilon = 1e-12);
    }

    #[test]
    fn col_means_follow_transposed_layout() {
        let img = Image::from_vec(3, 2, vec![0u8, 3, 6, 255, 255, 0]).expect("valid image");
        let profile = extract_profile_u8(&img.as_view(), ProfileAxis::Cols).expect("non-empty");

        assert_eq!(profile.len(), 3);
        assert_abs_diff_eq!(profile[0], 127.5, epsilon = 1e-12);
        assert_abs_diff_eq!(profile[1], 129.0, epsilon = 1e-12);
        assert_abs_diff_eq!(profile[2], 3.0, epsilon = 1e-12);
        assert_eq!(ProfileAxis::Cols.line_count(&img.as_view()), 3);
    }

    #[test]
    fn strided_view_ignores_padding() {
        let data = [10u8, 20, 250, 30, 40, 250];
        let view = ImageView::from_slice(2, 2, 3, &data).expect("valid view");
        let profile = extract_profile_u8(&view, ProfileAxis::Rows).expect("non-empty");
        assert_eq!(profile, vec![15.0, 35.0]);
    }

    #[test]
    fn zero_area_frame_has_no_profile() {
        let img = Image::<u8>::from_vec(4, 0, Vec::new()).expect("zero height");
        assert!(extract_profile_u8(&img.as_view(), ProfileAxis::Rows).is_none());
        assert!(extract_profile_u8(&img.as_view(), ProfileAxis::Cols).is_none());
    }
}
