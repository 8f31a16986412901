//! URL composition for list/get/pdf/preview actions.
//!
//! Every parameter bag lists its fields in a fixed emission order. Only fields
//! that are set are emitted. `filter` is the only percent-encoded value; the
//! rest go out verbatim, which callers of the remote API rely on.

use std::borrow::Cow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Raw,
    Percent,
}

/// One query field: name, value when present, and how the value is written.
#[derive(Debug)]
pub struct QueryField<'a> {
    name: &'static str,
    value: Option<Cow<'a, str>>,
    encoding: Encoding,
}

impl<'a> QueryField<'a> {
    /// Field emitted verbatim.
    #[must_use]
    pub fn raw(name: &'static str, value: Option<&'a str>) -> Self {
        Self {
            name,
            value: value.map(Cow::Borrowed),
            encoding: Encoding::Raw,
        }
    }

    /// Numeric field, emitted verbatim in decimal.
    #[must_use]
    pub fn number(name: &'static str, value: Option<u32>) -> Self {
        Self {
            name,
            value: value.map(|n| Cow::Owned(n.to_string())),
            encoding: Encoding::Raw,
        }
    }

    /// Field whose value is percent-encoded.
    #[must_use]
    pub fn encoded(name: &'static str, value: Option<&'a str>) -> Self {
        Self {
            name,
            value: value.map(Cow::Borrowed),
            encoding: Encoding::Percent,
        }
    }

    fn render(&self) -> Option<String> {
        let value = self.value.as_deref()?;
        Some(match self.encoding {
            Encoding::Raw => format!("{}={value}", self.name),
            Encoding::Percent => format!("{}={}", self.name, urlencoding::encode(value)),
        })
    }
}

/// A typed parameter bag that knows its field order.
pub trait QueryParams {
    fn fields(&self) -> Vec<QueryField<'_>>;
}

/// `baseUrl + path`, followed by `?` and the present fields joined with `&`.
#[must_use]
pub fn compose_url<P: QueryParams + ?Sized>(
    base_url: &str,
    path: &str,
    params: Option<&P>,
) -> String {
    let query = params
        .map(|p| {
            p.fields()
                .iter()
                .filter_map(QueryField::render)
                .collect::<Vec<_>>()
                .join("&")
        })
        .unwrap_or_default();

    if query.is_empty() {
        format!("{base_url}{path}")
    } else {
        format!("{base_url}{path}?{query}")
    }
}

/// Parameters of list actions. Emission order: q, filter, with, limit, offset, sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub q: Option<String>,
    pub filter: Option<String>,
    pub with: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<String>,
}

impl ListParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn q(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    #[must_use]
    pub fn with(mut self, with: impl Into<String>) -> Self {
        self.with = Some(with.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: impl Into<String>) -> Self {
        self.sort = Some(sort.into());
        self
    }
}

impl QueryParams for ListParams {
    fn fields(&self) -> Vec<QueryField<'_>> {
        vec![
            QueryField::raw("q", self.q.as_deref()),
            QueryField::encoded("filter", self.filter.as_deref()),
            QueryField::raw("with", self.with.as_deref()),
            QueryField::number("limit", self.limit),
            QueryField::number("offset", self.offset),
            QueryField::raw("sort", self.sort.as_deref()),
        ]
    }
}

/// Parameters of get actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetParams {
    pub with: Option<String>,
}

impl GetParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, with: impl Into<String>) -> Self {
        self.with = Some(with.into());
        self
    }
}

impl QueryParams for GetParams {
    fn fields(&self) -> Vec<QueryField<'_>> {
        vec![QueryField::raw("with", self.with.as_deref())]
    }
}

/// Parameters of PDF download actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfParams {
    pub options: Option<String>,
}

impl PdfParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }
}

impl QueryParams for PdfParams {
    fn fields(&self) -> Vec<QueryField<'_>> {
        vec![QueryField::raw("options", self.options.as_deref())]
    }
}

/// Parameters of preview actions. Emission order: size, page, options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewParams {
    pub size: Option<String>,
    pub page: Option<u32>,
    pub options: Option<String>,
}

impl PreviewParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.options = Some(options.into());
        self
    }
}

impl QueryParams for PreviewParams {
    fn fields(&self) -> Vec<QueryField<'_>> {
        vec![
            QueryField::raw("size", self.size.as_deref()),
            QueryField::number("page", self.page),
            QueryField::raw("options", self.options.as_deref()),
        ]
    }
}

#[must_use]
pub fn list_url(base_url: &str, path: &str, params: Option<&ListParams>) -> String {
    compose_url(base_url, path, params)
}

#[must_use]
pub fn get_url(base_url: &str, path: &str, params: Option<&GetParams>) -> String {
    compose_url(base_url, path, params)
}

#[must_use]
pub fn pdf_url(base_url: &str, path: &str, params: Option<&PdfParams>) -> String {
    compose_url(base_url, path, params)
}

#[must_use]
pub fn preview_url(base_url: &str, path: &str, params: Option<&PreviewParams>) -> String {
    compose_url(base_url, path, params)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://api.example.com/v1";

    #[test]
    fn test_no_params_is_bare_path() {
        assert_eq!(list_url(BASE, "/items", None), "https://api.example.com/v1/items");
    }

    #[test]
    fn test_empty_bags_are_bare_path() {
        let bare = "https://api.example.com/v1/items/1";
        assert_eq!(list_url(BASE, "/items/1", Some(&ListParams::new())), bare);
        assert_eq!(get_url(BASE, "/items/1", Some(&GetParams::new())), bare);
        assert_eq!(pdf_url(BASE, "/items/1", Some(&PdfParams::new())), bare);
        assert_eq!(preview_url(BASE, "/items/1", Some(&PreviewParams::new())), bare);
    }

    #[test]
    fn test_filter_encoded_limit_raw() {
        let params = ListParams::new().filter("a&b").limit(10);
        assert_eq!(
            list_url(BASE, "/items", Some(&params)),
            "https://api.example.com/v1/items?filter=a%26b&limit=10"
        );
    }

    #[test]
    fn test_list_field_order_is_fixed() {
        let params = ListParams::new()
            .sort("-created")
            .offset(20)
            .limit(10)
            .with("client")
            .filter("status:paid")
            .q("acme");
        assert_eq!(
            list_url(BASE, "/items", Some(&params)),
            "https://api.example.com/v1/items?q=acme&filter=status%3Apaid&with=client&limit=10&offset=20&sort=-created"
        );
    }

    // Only `filter` is percent-encoded. Other values are emitted as given,
    // even when they contain reserved characters.
    #[test]
    fn test_non_filter_values_are_not_encoded() {
        let params = ListParams::new().q("a&b c").filter("a&b c");
        assert_eq!(
            list_url(BASE, "/items", Some(&params)),
            "https://api.example.com/v1/items?q=a&b c&filter=a%26b%20c"
        );
    }

    #[test]
    fn test_zero_values_are_present() {
        let params = ListParams::new().offset(0);
        assert_eq!(
            list_url(BASE, "/items", Some(&params)),
            "https://api.example.com/v1/items?offset=0"
        );
    }

    #[test]
    fn test_get_with() {
        let params = GetParams::new().with("client,lines");
        assert_eq!(
            get_url(BASE, "/items/5", Some(&params)),
            "https://api.example.com/v1/items/5?with=client,lines"
        );
    }

    #[test]
    fn test_pdf_options() {
        let params = PdfParams::new().options("lang=de");
        assert_eq!(
            pdf_url(BASE, "/items/5/pdf", Some(&params)),
            "https://api.example.com/v1/items/5/pdf?options=lang=de"
        );
    }

    #[test]
    fn test_preview_order() {
        let params = PreviewParams::new().options("x").page(2).size("small");
        assert_eq!(
            preview_url(BASE, "/items/5/preview", Some(&params)),
            "https://api.example.com/v1/items/5/preview?size=small&page=2&options=x"
        );
    }
}
