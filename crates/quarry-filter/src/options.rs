//! Pagination, projection and sort options for a find operation.

use std::collections::BTreeMap;

use bson::Document;

use crate::error::QueryError;
use crate::sort::Sort;

/// Pre-parsed pagination, projection and sort lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `limit`, `offset`, `skip`, `page` and `size` entries.
    pub page: BTreeMap<String, i64>,
    /// Projected fields; a leading `-` excludes the field.
    pub fields: Vec<String>,
    /// Sort keys; a leading `-` sorts descending.
    pub sort: Vec<String>,
}

/// Options ready to hand to a find operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
    pub projection: Option<Document>,
    pub sort: Option<Document>,
}

/// Build [`FindOptions`], running `check` on every projected or sorted field.
pub(crate) fn build(
    options: &QueryOptions,
    check: impl Fn(&str) -> Result<(), QueryError>,
) -> Result<FindOptions, QueryError> {
    let mut find = FindOptions::default();
    paginate(&options.page, &mut find);

    let mut projection = Document::new();
    for raw in &options.fields {
        let (include, rest) = match raw.strip_prefix('-') {
            Some(rest) => (0_i32, rest),
            None => (1_i32, raw.as_str()),
        };
        let field = rest.strip_prefix('+').unwrap_or(rest);
        if field.is_empty() {
            continue;
        }
        check(field)?;
        projection.insert(field, include);
    }
    if !projection.is_empty() {
        find.projection = Some(projection);
    }

    let mut sort = Document::new();
    for sort_key in options.sort.iter().map(|raw| Sort::parse(raw)) {
        if sort_key.field.is_empty() {
            continue;
        }
        check(&sort_key.field)?;
        sort.insert(sort_key.field, sort_key.direction.as_i32());
    }
    if !sort.is_empty() {
        find.sort = Some(sort);
    }

    Ok(find)
}

/// `limit` with `offset`/`skip`, then `size` with `page`; later entries win.
fn paginate(page: &BTreeMap<String, i64>, find: &mut FindOptions) {
    if let Some(&limit) = page.get("limit") {
        find.limit = Some(limit);
        if let Some(&offset) = page.get("offset") {
            find.skip = Some(offset);
        }
        if let Some(&skip) = page.get("skip") {
            find.skip = Some(skip);
        }
    }

    if let Some(&size) = page.get("size") {
        find.limit = Some(size);
        if let Some(&number) = page.get("page") {
            find.skip = Some(number.saturating_mul(size));
        }
    }
}
