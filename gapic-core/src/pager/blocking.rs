use super::{AsyncPager, Page, PageSource, PagerState, state::Cursor};
use std::future::Future;
use tokio::runtime::Handle;

/// Lazily iterates the results of a list method from synchronous code.
///
/// Each page fetch runs to completion on the calling thread. When the source talks to a tonic
/// channel, pass the [`Handle`] of the runtime owning that channel so it is entered during the
/// fetch.
pub struct Pager<S: PageSource> {
    cursor: Cursor<S>,
    runtime: Option<Handle>,
}

impl<S: PageSource> Pager<S> {
    pub fn new(source: S) -> Self {
        Self {
            cursor: Cursor::new(source),
            runtime: None,
        }
    }

    /// Creates a pager and fetches the first page right away.
    pub fn start(source: S, runtime: Option<Handle>) -> Result<Self, S::Error> {
        let mut pager = Self::new(source).with_runtime(runtime);
        block_on(pager.runtime.as_ref(), pager.cursor.prime())?;
        Ok(pager)
    }

    /// Continues an async pager from blocking code, keeping anything it already fetched.
    pub fn from_async(pager: AsyncPager<S>, runtime: Option<Handle>) -> Self {
        Self {
            cursor: pager.into_cursor(),
            runtime,
        }
    }

    pub fn with_runtime(mut self, runtime: Option<Handle>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn next_page_token(&self) -> Option<&str> {
        self.cursor.next_page_token()
    }

    pub fn state(&self) -> &PagerState {
        self.cursor.state()
    }

    pub fn next_page(&mut self) -> Option<Result<Page<S::Item>, S::Error>> {
        block_on(self.runtime.as_ref(), self.cursor.next_page())
    }

    /// Switches to page-level iteration.
    pub fn pages(self) -> Pages<S> {
        Pages(self)
    }
}

impl<S: PageSource> Iterator for Pager<S> {
    type Item = Result<S::Item, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        block_on(self.runtime.as_ref(), self.cursor.next_item())
    }
}

/// Page-level iterator returned by [`Pager::pages`].
pub struct Pages<S: PageSource>(Pager<S>);

impl<S: PageSource> Iterator for Pages<S> {
    type Item = Result<Page<S::Item>, S::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next_page()
    }
}

fn block_on<F: Future>(runtime: Option<&Handle>, future: F) -> F::Output {
    let _guard = runtime.map(Handle::enter);
    futures_executor::block_on(future)
}
