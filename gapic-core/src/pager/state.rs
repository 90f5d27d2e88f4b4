use super::{Page, PageSource};
use std::collections::VecDeque;
use tracing::debug;

/// Where a pager stands between two fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerState {
    /// The next fetch uses this token. The initial state is `Ready("")`.
    Ready(String),
    /// The last page was seen, or a fetch failed. No fetch will ever be issued again.
    Exhausted,
}

impl Default for PagerState {
    fn default() -> Self {
        PagerState::Ready(String::new())
    }
}

impl PagerState {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, PagerState::Exhausted)
    }

    fn advance(&mut self, next_page_token: &str) {
        *self = if next_page_token.is_empty() {
            PagerState::Exhausted
        } else {
            PagerState::Ready(next_page_token.to_string())
        };
    }
}

/// State shared by the blocking and async pagers.
///
/// `buffer` holds the not yet handed out items of the last fetched page. `page_pending` is set
/// while that page has not been handed out as a whole either, so an eagerly fetched first page
/// is still reported by page-level iteration even when it is empty.
pub(crate) struct Cursor<S: PageSource> {
    source: S,
    state: PagerState,
    buffer: VecDeque<S::Item>,
    page_pending: bool,
    next_page_token: Option<String>,
}

impl<S: PageSource> Cursor<S> {
    pub(crate) fn new(source: S) -> Self {
        Self {
            source,
            state: PagerState::default(),
            buffer: VecDeque::new(),
            page_pending: false,
            next_page_token: None,
        }
    }

    pub(crate) fn state(&self) -> &PagerState {
        &self.state
    }

    /// The continuation token of the most recently fetched page.
    pub(crate) fn next_page_token(&self) -> Option<&str> {
        self.next_page_token.as_deref()
    }

    /// Fetches one page and keeps it buffered. Used to start a pager eagerly.
    pub(crate) async fn prime(&mut self) -> Result<(), S::Error> {
        if let Some(page) = self.fetch().await {
            let page = page?;
            self.buffer.extend(page.items);
            self.page_pending = true;
        }
        Ok(())
    }

    pub(crate) async fn next_item(&mut self) -> Option<Result<S::Item, S::Error>> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                if self.buffer.is_empty() {
                    self.page_pending = false;
                }
                return Some(Ok(item));
            }
            self.page_pending = false;

            match self.fetch().await? {
                Ok(page) => self.buffer.extend(page.items),
                Err(err) => return Some(Err(err)),
            }
        }
    }

    pub(crate) async fn next_page(&mut self) -> Option<Result<Page<S::Item>, S::Error>> {
        if self.page_pending || !self.buffer.is_empty() {
            self.page_pending = false;
            let items = self.buffer.drain(..).collect();
            let token = self.next_page_token.clone().unwrap_or_default();
            return Some(Ok(Page::new(items, token)));
        }

        self.fetch().await
    }

    async fn fetch(&mut self) -> Option<Result<Page<S::Item>, S::Error>> {
        let token = match &self.state {
            PagerState::Ready(token) => token.clone(),
            PagerState::Exhausted => return None,
        };

        debug!(page_token = %token, "fetching page");
        match self.source.fetch(&token).await {
            Ok(page) => {
                debug!(
                    items = page.items.len(),
                    next_page_token = %page.next_page_token,
                    "fetched page"
                );
                self.state.advance(&page.next_page_token);
                self.next_page_token = Some(page.next_page_token.clone());
                Some(Ok(page))
            }
            Err(err) => {
                debug!(page_token = %token, "page fetch failed, pager exhausted");
                self.state = PagerState::Exhausted;
                Some(Err(err))
            }
        }
    }
}
