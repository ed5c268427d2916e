//! This modules defines the common functionality for paging data.

use serde::{Deserialize, Serialize};

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of items per page when not specified in a request.
    pub default_page_size: u64,
    /// The largest page size a request may ask for.
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

/// The raw `?page=` and `?page_size=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// A validated request for one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    /// Build a page request from the query parameters.
    ///
    /// A page size that is missing or not a positive integer falls back to
    /// the default, and larger sizes are clamped to the configured maximum.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage] if the page number is not a positive integer.
    pub fn from_params(params: &PageParams, config: &PaginationConfig) -> Result<Self, Error> {
        let page = match params.page.as_deref().map(str::trim) {
            None | Some("") => 1,
            Some(raw) => match raw.parse::<u64>() {
                Ok(page) if page > 0 => page,
                _ => return Err(Error::InvalidPage),
            },
        };

        let page_size = params
            .page_size
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .filter(|&size| size > 0)
            .map(|size| size.min(config.max_page_size))
            .unwrap_or(config.default_page_size);

        Ok(Self { page, page_size })
    }

    /// The number of rows to skip.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The number of items across all pages.
    pub count: u64,
    /// The next page number, if there is one.
    pub next: Option<u64>,
    /// The previous page number, if there is one.
    pub previous: Option<u64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Wrap the `results` of `request` from a listing of `count` items.
    ///
    /// # Errors
    /// Returns [Error::InvalidPage] if the page lies past the end of the
    /// listing. The first page is always valid, even when empty.
    pub fn new(results: Vec<T>, count: u64, request: PageRequest) -> Result<Self, Error> {
        if request.page > 1 && request.offset() >= count {
            return Err(Error::InvalidPage);
        }

        let next = (request.offset() + (results.len() as u64) < count).then_some(request.page + 1);
        let previous = (request.page > 1).then(|| request.page - 1);

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::Error;

    use super::{Page, PageParams, PageRequest, PaginationConfig};

    fn params(page: Option<&str>, page_size: Option<&str>) -> PageParams {
        PageParams {
            page: page.map(str::to_owned),
            page_size: page_size.map(str::to_owned),
        }
    }

    #[test]
    fn defaults_to_first_page() {
        let request =
            PageRequest::from_params(&PageParams::default(), &PaginationConfig::default()).unwrap();

        assert_eq!(
            request,
            PageRequest {
                page: 1,
                page_size: 20
            }
        );
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn clamps_page_size() {
        let request =
            PageRequest::from_params(&params(Some("3"), Some("5000")), &PaginationConfig::default())
                .unwrap();

        assert_eq!(request.page_size, 100);
        assert_eq!(request.offset(), 200);
    }

    #[test]
    fn ignores_bad_page_size() {
        let request =
            PageRequest::from_params(&params(None, Some("lots")), &PaginationConfig::default())
                .unwrap();

        assert_eq!(request.page_size, 20);
    }

    #[test]
    fn rejects_bad_page_numbers() {
        let config = PaginationConfig::default();

        assert_eq!(
            PageRequest::from_params(&params(Some("0"), None), &config),
            Err(Error::InvalidPage)
        );
        assert_eq!(
            PageRequest::from_params(&params(Some("last"), None), &config),
            Err(Error::InvalidPage)
        );
    }

    #[test]
    fn links_neighbouring_pages() {
        let request = PageRequest {
            page: 2,
            page_size: 2,
        };

        let page = Page::new(vec![3, 4], 5, request).unwrap();

        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));
        assert_eq!(page.count, 5);
    }

    #[test]
    fn last_page_has_no_next() {
        let request = PageRequest {
            page: 3,
            page_size: 2,
        };

        let page = Page::new(vec![5], 5, request).unwrap();

        assert_eq!(page.next, None);
    }

    #[test]
    fn empty_first_page_is_valid() {
        let page = Page::<i64>::new(vec![], 0, PageRequest { page: 1, page_size: 20 }).unwrap();

        assert_eq!(page.results, Vec::<i64>::new());
        assert_eq!(page.next, None);
        assert_eq!(page.previous, None);
    }

    #[test]
    fn page_past_the_end_is_invalid() {
        let result = Page::<i64>::new(vec![], 4, PageRequest { page: 3, page_size: 2 });

        assert_eq!(result, Err(Error::InvalidPage));
    }
}
