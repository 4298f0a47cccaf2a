use std::fmt;

/// An LSB ordered bitmap.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    len: usize,
    data: Vec<u8>,
}

impl Bitmap {
    pub fn with_capacity(cap: usize) -> Self {
        Bitmap {
            len: 0,
            data: Vec::with_capacity(cap.div_ceil(8)),
        }
    }

    pub fn new_with_all_true(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![u8::MAX; len.div_ceil(8)],
        }
    }

    pub fn new_with_all_false(len: usize) -> Self {
        Bitmap {
            len,
            data: vec![0; len.div_ceil(8)],
        }
    }

    /// Get the number of bits being tracked by this bitmap.
    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn count_trues(&self) -> usize {
        let mut count = self
            .data
            .iter()
            .map(|&b| b.count_ones())
            .fold(0, |acc, v| acc + (v as usize));

        // Only count bits making up the logical portion of the bitmap.
        let rem = self.len % 8;
        if let (true, Some(last)) = (rem != 0, self.data.last()) {
            count -= last.count_ones() as usize;
            let mask = (255u8 << (8 - rem)) >> (8 - rem);
            count += (mask & last).count_ones() as usize;
        }

        count
    }

    pub fn is_all_true(&self) -> bool {
        self.count_trues() == self.len()
    }

    /// Push a value onto the end of the bitmap.
    pub fn push(&mut self, val: bool) {
        if self.len == self.data.len() * 8 {
            self.data.push(0);
        }
        let idx = self.len;
        self.len += 1;
        self.set_unchecked(idx, val);
    }

    /// Get the value at index.
    ///
    /// Panics if index is out of bounds.
    #[inline]
    pub fn value(&self, idx: usize) -> bool {
        let byte = self.data[idx >> 3];
        (byte >> (idx & 7)) & 1 != 0
    }

    /// Set a bit at index.
    ///
    /// Panics if index is out of bounds.
    #[inline]
    pub fn set_unchecked(&mut self, idx: usize, val: bool) {
        let byte = idx / 8;
        let bit = idx & 7;
        if val {
            self.data[byte] |= 1 << bit;
        } else {
            self.data[byte] &= !(1 << bit);
        }
    }

    pub const fn iter(&self) -> BitmapIter<'_> {
        BitmapIter {
            idx: 0,
            bitmap: self,
        }
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<bool> for Bitmap {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut bitmap = Bitmap::with_capacity(iter.size_hint().0);
        for val in iter {
            bitmap.push(val);
        }
        bitmap
    }
}

#[derive(Debug)]
pub struct BitmapIter<'a> {
    idx: usize,
    bitmap: &'a Bitmap,
}

impl Iterator for BitmapIter<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.bitmap.len() {
            return None;
        }
        let v = self.bitmap.value(self.idx);
        self.idx += 1;
        Some(v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.bitmap.len() - self.idx;
        (rem, Some(rem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_read() {
        let mut bm = Bitmap::default();
        for i in 0..19 {
            bm.push(i % 3 == 0);
        }
        assert_eq!(19, bm.len());
        assert!(bm.value(0));
        assert!(!bm.value(1));
        assert!(bm.value(18));
        assert_eq!(7, bm.count_trues());
    }

    #[test]
    fn count_trues_ignores_trailing_bits() {
        let bm = Bitmap::new_with_all_true(10);
        assert_eq!(10, bm.count_trues());
        assert!(bm.is_all_true());
    }

    #[test]
    fn set_unset() {
        let mut bm = Bitmap::new_with_all_false(9);
        bm.set_unchecked(8, true);
        let got: Vec<_> = bm.iter().collect();
        assert_eq!(
            vec![false, false, false, false, false, false, false, false, true],
            got
        );
        bm.set_unchecked(8, false);
        assert_eq!(0, bm.count_trues());
    }
}
