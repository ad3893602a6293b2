use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{request::Parts, Uri},
};
use serde::Serialize;

use crate::config;
use crate::error::ApiError;

const PAGE_PARAM: &str = "page";

/// List envelope: `{count, next, previous, results}`
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// What the client asked for in `?page=`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(i64),
    Last,
}

/// Fixed-size page selected by the `page` query parameter (1-based)
#[derive(Debug, Clone)]
pub struct Pagination {
    pub requested: PageRequest,
    pub number: i64,
    pub size: i64,
    uri: Uri,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Pagination
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Nested routers rewrite the path; links should point at what the client asked for
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map(|original| original.0.clone())
            .unwrap_or_else(|| parts.uri.clone());
        Pagination::new(uri, config::config().api.page_size)
    }
}

impl Pagination {
    pub fn new(uri: Uri, size: i64) -> Result<Self, ApiError> {
        let requested = match query_pairs(&uri).into_iter().find(|(k, _)| k == PAGE_PARAM) {
            None => PageRequest::Number(1),
            Some((_, v)) if v == "last" => PageRequest::Last,
            Some((_, v)) => v
                .parse::<i64>()
                .ok()
                .filter(|n| *n >= 1)
                .map(PageRequest::Number)
                .ok_or_else(|| ApiError::not_found("Invalid page."))?,
        };
        let number = match requested {
            PageRequest::Number(n) => n,
            PageRequest::Last => 1,
        };

        Ok(Self {
            requested,
            number,
            size: size.max(1),
            uri,
        })
    }

    pub fn page_count(&self, count: i64) -> i64 {
        ((count + self.size - 1) / self.size).max(1)
    }

    /// Resolve `last` and reject pages past the end. An empty list still has page 1.
    pub fn clamp_to(&mut self, count: i64) -> Result<(), ApiError> {
        let pages = self.page_count(count);
        if self.requested == PageRequest::Last {
            self.number = pages;
        }
        if self.number > pages {
            return Err(ApiError::not_found("Invalid page."));
        }
        Ok(())
    }

    pub fn limit(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.number - 1) * self.size
    }

    pub fn paginate<T: Serialize>(&self, count: i64, results: Vec<T>) -> Paginated<T> {
        let next = (self.number < self.page_count(count)).then(|| self.link(self.number + 1));
        let previous = (self.number > 1).then(|| self.link(self.number - 1));
        Paginated {
            count,
            next,
            previous,
            results,
        }
    }

    /// Same path and query with `page` replaced; page 1 drops the parameter
    fn link(&self, page: i64) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in query_pairs(&self.uri).iter().filter(|(k, _)| k != PAGE_PARAM) {
            serializer.append_pair(k, v);
        }
        if page > 1 {
            serializer.append_pair(PAGE_PARAM, &page.to_string());
        }
        let query = serializer.finish();

        if query.is_empty() {
            self.uri.path().to_string()
        } else {
            format!("{}?{}", self.uri.path(), query)
        }
    }
}

fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(uri: &str) -> Pagination {
        Pagination::new(uri.parse().unwrap(), 10).unwrap()
    }

    #[test]
    fn defaults_to_first_page() {
        let p = page("/chats/");
        assert_eq!(p.number, 1);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.limit(), 10);
    }

    #[test]
    fn builds_links_both_ways() {
        let mut p = page("/messages/?page=2");
        p.clamp_to(25).unwrap();
        let out = p.paginate(25, vec![0u8; 10]);
        assert_eq!(out.next.as_deref(), Some("/messages/?page=3"));
        assert_eq!(out.previous.as_deref(), Some("/messages/"));
        assert_eq!(p.offset(), 10);
    }

    #[test]
    fn keeps_other_query_params() {
        let p = page("/users/?format=json");
        let out = p.paginate(11, Vec::<u8>::new());
        assert_eq!(out.next.as_deref(), Some("/users/?format=json&page=2"));
        assert_eq!(out.previous, None);
    }

    #[test]
    fn single_page_has_no_links() {
        let mut p = page("/chats/");
        p.clamp_to(0).unwrap();
        let out = p.paginate(0, Vec::<u8>::new());
        assert_eq!(out.count, 0);
        assert!(out.next.is_none() && out.previous.is_none());
    }

    #[test]
    fn page_past_the_end_is_not_found() {
        let mut p = page("/chats/?page=3");
        let err = p.clamp_to(20).unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn last_resolves_to_final_page() {
        let mut p = page("/chats/?page=last");
        p.clamp_to(21).unwrap();
        assert_eq!(p.number, 3);
    }

    #[test]
    fn huge_page_number_is_not_last() {
        let mut p = page("/chats/?page=9223372036854775807");
        assert_eq!(p.requested, PageRequest::Number(i64::MAX));
        assert!(p.clamp_to(21).is_err());
    }

    #[test]
    fn garbage_page_is_not_found() {
        assert!(Pagination::new("/chats/?page=0".parse().unwrap(), 10).is_err());
        assert!(Pagination::new("/chats/?page=abc".parse().unwrap(), 10).is_err());
    }
}
