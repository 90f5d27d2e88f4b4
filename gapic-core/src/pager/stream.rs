use super::{Page, PageSource, PagerState, state::Cursor};
use futures_util::{Stream, stream};

/// Lazily iterates the results of a list method from async code.
///
/// At most one fetch is in flight (every method takes `&mut self`) and the next page is only
/// requested once every item of the current one was handed out. Dropping the pager stops
/// iteration; nothing is fetched in the background.
pub struct AsyncPager<S: PageSource> {
    cursor: Cursor<S>,
}

impl<S: PageSource> AsyncPager<S> {
    /// Creates a pager that issues its first fetch on first use.
    pub fn new(source: S) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Creates a pager and fetches the first page right away, so errors of the initial request
    /// surface here and [`AsyncPager::next_page_token`] is immediately available.
    pub async fn start(source: S) -> Result<Self, S::Error> {
        let mut pager = Self::new(source);
        pager.cursor.prime().await?;
        Ok(pager)
    }

    /// The continuation token of the most recently fetched page, `None` before the first fetch.
    pub fn next_page_token(&self) -> Option<&str> {
        self.cursor.next_page_token()
    }

    pub fn state(&self) -> &PagerState {
        self.cursor.state()
    }

    /// The next item, fetching pages as needed. `None` once the last page was consumed.
    pub async fn next(&mut self) -> Option<Result<S::Item, S::Error>> {
        self.cursor.next_item().await
    }

    /// The next whole page, including the terminal one with an empty token.
    pub async fn next_page(&mut self) -> Option<Result<Page<S::Item>, S::Error>> {
        self.cursor.next_page().await
    }

    /// Item-level stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<S::Item, S::Error>> {
        stream::unfold(self, |mut pager| async move {
            let item = pager.next().await?;
            Some((item, pager))
        })
    }

    /// Page-level stream.
    pub fn pages(self) -> impl Stream<Item = Result<Page<S::Item>, S::Error>> {
        stream::unfold(self, |mut pager| async move {
            let page = pager.next_page().await?;
            Some((page, pager))
        })
    }

    pub(crate) fn into_cursor(self) -> Cursor<S> {
        self.cursor
    }
}
