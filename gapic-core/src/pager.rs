//! # Pagination
//!
//! List methods return one page of results per call, together with a continuation token. The
//! pagers in this module wrap a single-page fetch ([`PageSource`]) into a lazy, forward-only
//! sequence, either of items (flattened across pages) or of whole [`Page`] values.
//!
//! * [`AsyncPager`] suspends only while a page is being fetched and never prefetches.
//! * [`Pager`] is the blocking counterpart and implements [`Iterator`].
//!
//! Both drive the same [`PagerState`]: `Ready(token)` until a page comes back with an empty
//! `next_page_token`, `Exhausted` afterwards. A failed fetch is reported once and exhausts the
//! pager; items yielded before it stay valid.
mod blocking;
mod state;
mod stream;
#[cfg(test)]
mod testing;

pub use blocking::{Pager, Pages};
pub use state::PagerState;
pub use stream::AsyncPager;

use std::future::Future;

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token. Empty on the last page.
    pub next_page_token: String,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: impl Into<String>) -> Self {
        Self {
            items,
            next_page_token: next_page_token.into(),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_empty()
    }
}

/// A single-page fetch operation bound to an initial request.
///
/// `fetch("")` issues the initial request unchanged; any other token is a continuation taken
/// from the previous page.
pub trait PageSource {
    type Item;
    type Error;

    fn fetch(
        &mut self,
        page_token: &str,
    ) -> impl Future<Output = Result<Page<Self::Item>, Self::Error>>;
}
