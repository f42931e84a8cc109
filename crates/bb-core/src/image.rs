use crate::Error;

/// Owned grayscale frame, row-major with no padding.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

fn area(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        match area(width, height) {
            Some(n) if n == data.len() => Ok(Self {
                width,
                height,
                data,
            }),
            n => Err(Error::SizeMismatch {
                expected: n.unwrap_or(usize::MAX),
                actual: data.len(),
            }),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<T> {
        self.data
    }

    /// Panics if `y` is not a row of this frame.
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} outside frame of height {}", self.height);
        let w = self.width;
        &mut self.data[y * w..(y + 1) * w]
    }

    pub fn as_view(&self) -> ImageView<'_, T> {
        ImageView {
            width: self.width,
            height: self.height,
            stride: self.width,
            data: &self.data,
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Result<Self, Error> {
        let n = area(width, height).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: 0,
        })?;
        Ok(Self {
            width,
            height,
            data: vec![value; n],
        })
    }
}

/// Borrowed frame, possibly a padded camera buffer.
///
/// Row `y` starts at element `y * stride`; the `stride - width` elements after
/// each row are ignored.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T> {
    width: usize,
    height: usize,
    stride: usize,
    data: &'a [T],
}

impl<'a, T> ImageView<'a, T> {
    /// Wraps `data` without copying.
    ///
    /// The last row may omit its padding, so `data` needs only
    /// `(height - 1) * stride + width` elements.
    pub fn from_slice(
        width: usize,
        height: usize,
        stride: usize,
        data: &'a [T],
    ) -> Result<Self, Error> {
        if stride < width {
            return Err(Error::InvalidStride);
        }
        let needed = if width == 0 || height == 0 {
            Some(0)
        } else {
            (height - 1)
                .checked_mul(stride)
                .and_then(|n| n.checked_add(width))
        };
        match needed {
            Some(n) if n <= data.len() => Ok(Self {
                width,
                height,
                stride,
                data,
            }),
            n => Err(Error::SizeMismatch {
                expected: n.unwrap_or(usize::MAX),
                actual: data.len(),
            }),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Zero-area views carry no sensor lines and are dropped by the pipeline.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Panics if `y` is not a row of this view.
    pub fn row(&self, y: usize) -> &'a [T] {
        assert!(y < self.height, "row {y} outside view of height {}", self.height);
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }
}

impl<T: Clone> ImageView<'_, T> {
    /// Copies the visible pixels into a tightly packed frame.
    pub fn to_image(&self) -> Image<T> {
        Image {
            width: self.width,
            height: self.height,
            data: self.rows().flat_map(|r| r.iter().cloned()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Image, ImageView};
    use crate::Error;

    #[test]
    fn padded_camera_buffer() {
        // 3x2 frame with one padding byte per row; the last row is unpadded.
        let buf = [1u8, 2, 3, 0xAA, 4, 5, 6];
        let view = ImageView::from_slice(3, 2, 4, &buf).expect("valid view");

        assert_eq!(view.stride(), 4);
        assert_eq!(view.rows().collect::<Vec<_>>(), [&[1, 2, 3], &[4, 5, 6]]);

        let packed = view.to_image();
        assert_eq!(packed.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(packed.as_view().stride(), 3);
    }

    #[test]
    fn view_validation() {
        let buf = [0u8; 7];
        assert_eq!(
            ImageView::from_slice(4, 2, 3, &buf).unwrap_err(),
            Error::InvalidStride
        );
        assert_eq!(
            ImageView::from_slice(3, 2, 5, &buf).unwrap_err(),
            Error::SizeMismatch {
                expected: 8,
                actual: 7
            }
        );
        assert!(ImageView::from_slice(0, 5, 0, &buf[..0]).unwrap().is_empty());
    }

    #[test]
    fn zero_area_frames_are_empty() {
        let img = Image::<u8>::from_vec(0, 4, Vec::new()).expect("zero width is representable");
        assert!(img.is_empty());
        assert!(img.as_view().is_empty());

        let bad = Image::from_vec(2, 2, vec![0u8; 3]);
        assert_eq!(
            bad.unwrap_err(),
            Error::SizeMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn rows_can_be_written_in_place() {
        let mut img = Image::new_fill(3, 2, 0u8).expect("small image");
        img.row_mut(1)[..2].fill(128);
        assert_eq!(img.data(), &[0, 0, 0, 128, 128, 0]);
        assert_eq!(img.clone().into_raw().len(), 6);
    }
}
