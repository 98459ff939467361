//! Small query helpers over a parsed page: find by selector, read an
//! attribute or trimmed text, fall back to a second selector.

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::Selector(format!("{css}: {e:?}")))
}

/// First descendant of `el` matching `sel`.
pub fn first<'a>(el: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    el.select(sel).next()
}

/// Attribute `name` of the first descendant matching `sel`.
pub fn first_attr<'a>(el: ElementRef<'a>, sel: &Selector, name: &str) -> Option<&'a str> {
    first(el, sel).and_then(|found| found.value().attr(name))
}

/// All text under `el`, trimmed.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first `primary` match, else of the first `fallback` match.
pub fn text_or_fallback(el: ElementRef<'_>, primary: &Selector, fallback: &Selector) -> Option<String> {
    first(el, primary)
        .or_else(|| first(el, fallback))
        .map(text)
}

/// Cell `index` of a row, or a description of what is missing.
pub fn cell<'a>(cells: &[ElementRef<'a>], index: usize) -> std::result::Result<ElementRef<'a>, String> {
    cells
        .get(index)
        .copied()
        .ok_or_else(|| format!("expected at least {} cells, found {}", index + 1, cells.len()))
}
