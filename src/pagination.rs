//! Pagination queries: validity, link calculation and offset normalization.

use std::collections::BTreeMap;

use crate::api::ServerInfo;
use crate::error::HttpError;
use crate::node::{Link, Links};
use crate::request::{parse_query, Request};

/// The raw `page[...]` parameters of a request.
///
/// Two mutually exclusive strategies exist: `number`/`size` (1-based pages)
/// and `offset`/`limit` (0-based rows). Any other combination is not a valid
/// pagination request.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageQuery {
    number: Option<String>,
    size: Option<String>,
    offset: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    pub(crate) fn from_request(request: &Request) -> Self {
        let raw = |key: &str| {
            request
                .pagination
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
        };
        PageQuery {
            number: raw("number"),
            size: raw("size"),
            offset: raw("offset"),
            limit: raw("limit"),
        }
    }

    /// True when exactly one complete strategy is present.
    pub(crate) fn is_valid(&self) -> bool {
        matches!(
            (&self.number, &self.size, &self.offset, &self.limit),
            (Some(_), Some(_), None, None) | (None, None, Some(_), Some(_))
        )
    }

    /// Compute the first/prev/next/last links for a collection of `count`
    /// entries. Each link reuses the current query string with only the
    /// relevant pagination key rewritten.
    pub(crate) fn links(
        &self,
        request: &Request,
        server: &ServerInfo,
        count: u64,
    ) -> Result<Links, HttpError> {
        let raw = parse_query(request.uri.query().unwrap_or(""));
        let request_url = format!("{}{}", server.base_url(), request.uri.path());
        let mut links = Links::new();

        if let (Some(number), Some(size)) = (&self.number, &self.size) {
            let number = parse_value(number, "number")?;
            let size = parse_value(size, "size")?;
            if number == 0 {
                return Err(HttpError::new("invalid page number", 400));
            }
            if size == 0 {
                return Err(HttpError::new("invalid page size", 400));
            }

            if number != 1 {
                links.insert(
                    "first".to_string(),
                    page_link(&request_url, &raw, "page[number]", 1),
                );
                links.insert(
                    "prev".to_string(),
                    page_link(&request_url, &raw, "page[number]", number - 1),
                );
            }

            let total_pages = if count % size != 0 {
                count / size + 1
            } else {
                count / size
            };
            if number != total_pages {
                links.insert(
                    "next".to_string(),
                    page_link(&request_url, &raw, "page[number]", number + 1),
                );
                links.insert(
                    "last".to_string(),
                    page_link(&request_url, &raw, "page[number]", total_pages),
                );
            }
        } else if let (Some(offset), Some(limit)) = (&self.offset, &self.limit) {
            let offset = parse_value(offset, "offset")?;
            let limit = parse_value(limit, "limit")?;
            if limit == 0 {
                return Err(HttpError::new("invalid page limit", 400));
            }

            if offset != 0 {
                links.insert(
                    "first".to_string(),
                    page_link(&request_url, &raw, "page[offset]", 0),
                );
                links.insert(
                    "prev".to_string(),
                    page_link(&request_url, &raw, "page[offset]", offset.saturating_sub(limit)),
                );
            }

            if offset + limit < count {
                links.insert(
                    "next".to_string(),
                    page_link(&request_url, &raw, "page[offset]", offset + limit),
                );
                links.insert(
                    "last".to_string(),
                    page_link(&request_url, &raw, "page[offset]", count - limit),
                );
            }
        }

        Ok(links)
    }
}

/// A pagination request normalized to row bounds for a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    /// 0-based row offset.
    pub offset: u64,
    /// Row limit; `None` when only an offset was requested.
    pub limit: Option<u64>,
}

/// Normalize the pagination parameters of a request into row bounds.
///
/// `number`/`size` converts to `offset = size * (number - 1)`. A lone
/// `number` without `size` is ignored, mirroring the query grammar. Returns
/// `Ok(None)` when the request carries no pagination at all.
///
/// # Errors
///
/// Non-numeric values fail with a parse error; zero or negative `size`,
/// `number` and `limit` values fail with "invalid page size", "invalid page
/// number" and "invalid page limit" respectively.
pub fn page_bounds(request: &Request) -> Result<Option<PageBounds>, HttpError> {
    let pagination = &request.pagination;
    if pagination.is_empty() {
        return Ok(None);
    }

    if let Some(size) = pagination.get("size") {
        let size = parse_signed(size, "size")?;
        if size <= 0 {
            return Err(HttpError::new("invalid page size", 400));
        }
        if let Some(number) = pagination.get("number") {
            let number = parse_signed(number, "number")?;
            if number <= 0 {
                return Err(HttpError::new("invalid page number", 400));
            }
            return Ok(Some(PageBounds {
                offset: (size * (number - 1)) as u64,
                limit: Some(size as u64),
            }));
        }
        return Ok(Some(PageBounds {
            offset: 0,
            limit: Some(size as u64),
        }));
    }

    let offset = pagination.get("offset");
    let limit = pagination.get("limit");
    if offset.is_none() && limit.is_none() {
        return Ok(None);
    }

    let limit = match limit {
        Some(value) => {
            let limit = parse_signed(value, "limit")?;
            if limit <= 0 {
                return Err(HttpError::new("invalid page limit", 400));
            }
            Some(limit as u64)
        }
        None => None,
    };
    let offset = match offset {
        Some(value) => {
            let offset = parse_signed(value, "offset")?;
            if offset < 0 {
                return Err(HttpError::new("invalid page offset", 400));
            }
            offset as u64
        }
        None => 0,
    };

    Ok(Some(PageBounds { offset, limit }))
}

fn parse_value(value: &str, key: &str) -> Result<u64, HttpError> {
    value.parse::<u64>().map_err(|e| {
        HttpError::new(format!("cannot parse page[{key}] value {value:?}"), 400).with_source(e)
    })
}

fn parse_signed(value: &str, key: &str) -> Result<i64, HttpError> {
    value.parse::<i64>().map_err(|e| {
        HttpError::new(format!("cannot parse page[{key}] value {value:?}"), 400).with_source(e)
    })
}

/// Rebuild the query string with one pagination key rewritten, keys sorted.
fn page_link(
    request_url: &str,
    raw_query: &BTreeMap<String, Vec<String>>,
    key: &str,
    value: u64,
) -> Link {
    let mut params = raw_query.clone();
    params.insert(key.to_string(), vec![value.to_string()]);
    let query = params
        .iter()
        .flat_map(|(key, values)| values.iter().map(move |value| format!("{key}={value}")))
        .collect::<Vec<_>>()
        .join("&");
    Link::Url(format!("{request_url}?{query}"))
}
