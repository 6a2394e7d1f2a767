//! Key/offset pagination over id-ordered lists

use liquidity_types::{LiquidityError, LiquidityResult, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::{Deserialize, Serialize};

/// Page selector
///
/// `key` resumes strictly after the last id seen on the previous page and
/// takes precedence over `offset`. A zero `limit` means the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub key: Option<u64>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub limit: u64,
    #[serde(default)]
    pub count_total: bool,
}

impl PageRequest {
    pub fn after(key: u64, limit: u64) -> Self {
        Self { key: Some(key), limit, ..Self::default() }
    }

    pub fn with_limit(limit: u64) -> Self {
        Self { limit, ..Self::default() }
    }

    fn effective_limit(&self) -> LiquidityResult<usize> {
        let limit = match self.limit {
            0 => DEFAULT_PAGE_LIMIT,
            n if n > MAX_PAGE_LIMIT => {
                return Err(LiquidityError::invalid_parameter(
                    "pagination.limit",
                    &n.to_string(),
                    &format!("at most {}", MAX_PAGE_LIMIT),
                ))
            }
            n => n,
        };
        usize::try_from(limit).map_err(|_| LiquidityError::math_overflow("page limit"))
    }
}

/// Page metadata returned with list results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResponse {
    /// Id to pass as `key` for the next page, absent on the last page
    pub next_key: Option<u64>,
    /// Total number of items, when requested
    pub total: Option<u64>,
}

/// Slice an ascending `(id, item)` list into one page
pub fn paginate<T>(entries: Vec<(u64, T)>, page: &PageRequest) -> LiquidityResult<(Vec<T>, PageResponse)> {
    let limit = page.effective_limit()?;
    let total = if page.count_total { Some(entries.len() as u64) } else { None };

    let skip = match page.key {
        Some(key) => entries.iter().take_while(|(id, _)| *id <= key).count(),
        None => usize::try_from(page.offset).unwrap_or(usize::MAX).min(entries.len()),
    };

    let mut rest = entries.into_iter().skip(skip);
    let items: Vec<(u64, T)> = rest.by_ref().take(limit).collect();
    let next_key = match (rest.next(), items.last()) {
        (Some(_), Some((last_id, _))) => Some(*last_id),
        _ => None,
    };

    Ok((items.into_iter().map(|(_, item)| item).collect(), PageResponse { next_key, total }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(ids: &[u64]) -> Vec<(u64, u64)> {
        ids.iter().map(|id| (*id, *id * 10)).collect()
    }

    #[test]
    fn test_default_page() {
        let (items, page) = paginate(entries(&[1, 2, 3]), &PageRequest::default()).unwrap();
        assert_eq!(items, vec![10, 20, 30]);
        assert_eq!(page, PageResponse { next_key: None, total: None });
    }

    #[test]
    fn test_key_resumes_after_last_seen() {
        let list = entries(&[1, 3, 5, 7]);
        let (items, page) = paginate(list.clone(), &PageRequest::with_limit(2)).unwrap();
        assert_eq!(items, vec![10, 30]);
        assert_eq!(page.next_key, Some(3));

        let (items, page) = paginate(list, &PageRequest::after(3, 2)).unwrap();
        assert_eq!(items, vec![50, 70]);
        assert_eq!(page.next_key, None);
    }

    #[test]
    fn test_key_takes_precedence_over_offset() {
        let request = PageRequest { key: Some(1), offset: 3, limit: 1, count_total: true };
        let (items, page) = paginate(entries(&[1, 2, 3, 4]), &request).unwrap();
        assert_eq!(items, vec![20]);
        assert_eq!(page.next_key, Some(2));
        assert_eq!(page.total, Some(4));
    }

    #[test]
    fn test_offset_and_limits() {
        let request = PageRequest { offset: 2, ..PageRequest::default() };
        let (items, _) = paginate(entries(&[1, 2, 3]), &request).unwrap();
        assert_eq!(items, vec![30]);

        let request = PageRequest { offset: 10, ..PageRequest::default() };
        let (items, page) = paginate(entries(&[1, 2, 3]), &request).unwrap();
        assert!(items.is_empty());
        assert_eq!(page.next_key, None);

        assert!(paginate(entries(&[1]), &PageRequest::with_limit(MAX_PAGE_LIMIT + 1)).is_err());
    }
}
