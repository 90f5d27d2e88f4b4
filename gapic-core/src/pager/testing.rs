use super::{Page, PageSource};
use std::{cell::RefCell, collections::VecDeque, rc::Rc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FetchFailed(pub String);

/// Replays scripted pages and records every token it is asked for.
pub(crate) struct ScriptedSource {
    pages: VecDeque<Result<Page<&'static str>, FetchFailed>>,
    pub(crate) tokens: Rc<RefCell<Vec<String>>>,
}

impl ScriptedSource {
    pub(crate) fn new(
        pages: impl IntoIterator<Item = Result<Page<&'static str>, FetchFailed>>,
    ) -> Self {
        Self {
            pages: pages.into_iter().collect(),
            tokens: Rc::default(),
        }
    }

    /// `[a,b,c]/"t1"`, `[]/"t2"`, `[d]/"t3"`, `[e,f]/""`
    pub(crate) fn four_pages() -> Self {
        Self::new([
            Ok(Page::new(vec!["a", "b", "c"], "t1")),
            Ok(Page::new(vec![], "t2")),
            Ok(Page::new(vec!["d"], "t3")),
            Ok(Page::new(vec!["e", "f"], "")),
        ])
    }
}

impl PageSource for ScriptedSource {
    type Item = &'static str;
    type Error = FetchFailed;

    async fn fetch(&mut self, page_token: &str) -> Result<Page<&'static str>, FetchFailed> {
        self.tokens.borrow_mut().push(page_token.to_string());
        self.pages
            .pop_front()
            .unwrap_or_else(|| Err(FetchFailed(format!("unexpected fetch with '{page_token}'"))))
    }
}
