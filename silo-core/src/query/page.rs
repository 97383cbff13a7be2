use crate::{OrmError, Result};
use std::ops::Range;

/// One page of a paginated query.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub objects: Vec<T>,
    /// Rows matching the query, over all the pages.
    pub number_of_objects: u64,
    pub pages_total: u64,
    /// Number of this page, starting from 1.
    pub number: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    /// Resolve the requested page against `count` rows, returns the page number
    /// and the number of pages. `-1` is the last page.
    pub fn locate(count: u64, page_num: i64, page_size: u64) -> Result<(u64, u64)> {
        if page_size == 0 {
            return Err(OrmError::validation("page_size", page_size, "must be positive").into());
        }
        let pages_total = count.div_ceil(page_size);
        let number = match page_num {
            -1 => pages_total.max(1),
            n if n < 1 => {
                return Err(OrmError::validation("page_num", n, "is not a valid page number").into());
            }
            n => n as u64,
        };
        Ok((number, pages_total))
    }

    /// Rows covered by page `number`, as an offset range.
    pub fn rows(number: u64, page_size: u64) -> Result<Range<u64>> {
        let start = number
            .checked_sub(1)
            .and_then(|v| v.checked_mul(page_size))
            .filter(|v| v.checked_add(page_size).is_some())
            .ok_or_else(|| OrmError::validation("page_num", number, "is too large for the page size"))?;
        Ok(start..start + page_size)
    }

    /// Iterator over the objects of the page.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.objects.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::Page;

    #[test]
    fn locate_pages() {
        assert_eq!(Page::<()>::locate(0, 1, 10).unwrap(), (1, 0));
        assert_eq!(Page::<()>::locate(0, -1, 10).unwrap(), (1, 0));
        assert_eq!(Page::<()>::locate(95, -1, 10).unwrap(), (10, 10));
        assert_eq!(Page::<()>::locate(100, 3, 10).unwrap(), (3, 10));
        assert_eq!(Page::<()>::locate(100, 30, 10).unwrap(), (30, 10));
        assert!(Page::<()>::locate(100, 0, 10).is_err());
        assert!(Page::<()>::locate(100, -2, 10).is_err());
        assert!(Page::<()>::locate(100, 1, 0).is_err());
    }

    #[test]
    fn page_rows() {
        assert_eq!(Page::<()>::rows(1, 10).unwrap(), 0..10);
        assert_eq!(Page::<()>::rows(3, 10).unwrap(), 20..30);
        let (number, _) = Page::<()>::locate(5, i64::MAX, 10).unwrap();
        assert!(Page::<()>::rows(number, 10).is_err());
        assert!(Page::<()>::rows(u64::MAX / 2, 2).is_err());
        assert!(Page::<()>::rows(0, 10).is_err());
    }
}
