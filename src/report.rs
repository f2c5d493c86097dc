use crate::context::RenderContext;
use crate::document::{BaseDocument, RenderCache};
use crate::error::Result;
use crate::page::Page;

/// A multi-page report. Pages render in the order they were added.
#[derive(Debug, Clone, Default)]
pub struct Report {
    title: String,
    pages: Vec<Page>,
    global_css: String,
    format_name: Option<String>,
    cache: RenderCache,
}

impl Report {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Format inherited by every page added afterwards.
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format_name = Some(name.into());
        self
    }

    pub fn with_global_css(mut self, css: impl Into<String>) -> Self {
        self.global_css = css.into();
        self
    }

    pub fn set_global_css(&mut self, css: impl Into<String>) {
        self.global_css = css.into();
    }

    pub fn format_name(&self) -> Option<&str> {
        self.format_name.as_deref()
    }

    /// Append a page numbered `len + 1` and hand it back for filling in.
    pub fn add_page(&mut self) -> &mut Page {
        let format_name = self.format_name.clone();
        self.push_page(format_name)
    }

    pub fn add_page_with_format(&mut self, name: impl Into<String>) -> &mut Page {
        self.push_page(Some(name.into()))
    }

    fn push_page(&mut self, format_name: Option<String>) -> &mut Page {
        let number = self.pages.len() + 1;
        self.pages.push(Page::new(number, format_name));
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl BaseDocument for Report {
    fn title(&self) -> &str {
        &self.title
    }

    fn global_css(&self) -> &str {
        &self.global_css
    }

    fn cache(&self) -> &RenderCache {
        &self.cache
    }

    fn render_css(&self, ctx: &RenderContext) -> Result<String> {
        let mut blocks = Vec::new();
        for page in &self.pages {
            let css = page.render_css(ctx.formats())?;
            if !css.is_empty() {
                blocks.push(format!("/* Page {} CSS */\n{css}", page.page_number()));
            }
        }
        Ok(blocks.join("\n\n"))
    }

    fn render_content(&self, ctx: &RenderContext) -> Result<String> {
        let pages = self
            .pages
            .iter()
            .map(|page| page.render(ctx.formats()))
            .collect::<Result<Vec<_>>>()?;
        Ok(pages.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_are_numbered_in_call_order() {
        let mut report = Report::new("R");
        report.add_page();
        report.add_page_with_format("minimal");
        report.add_page();
        let numbers: Vec<usize> = report.pages().iter().map(Page::page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(report.page(1).and_then(Page::format_name), Some("minimal"));
    }

    #[test]
    fn report_format_is_inherited_by_pages() {
        let mut report = Report::new("R").format("corporate");
        let page = report.add_page();
        assert_eq!(page.format_name(), Some("corporate"));
    }
}
