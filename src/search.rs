//! Version search
//!
//! Filtering, ordering and paging of versions for
//! [`VersionManager::search_versions`](crate::VersionManager::search_versions).
//! The manager hands over every stored version in a deterministic order (file
//! id, then version number); sorting here is stable, so ties keep that order.

use crate::error::{Result, VersionError};
use crate::types::{FileVersion, SearchQuery, SearchResult, SortField, SortOrder};
use std::cmp::Ordering;

/// Reject queries that can never match or cannot be paged
pub fn validate(query: &SearchQuery) -> Result<()> {
    if let (Some(from), Some(to)) = (query.date_from, query.date_to) {
        if from > to {
            return Err(VersionError::validation(format!(
                "date_from ({}) is after date_to ({})",
                from, to
            )));
        }
    }
    if query.limit == 0 {
        return Err(VersionError::validation("limit must be at least 1"));
    }
    Ok(())
}

/// Whether a version satisfies every filter in the query
pub fn matches(version: &FileVersion, query: &SearchQuery) -> bool {
    if let Some(file_id) = &query.file_id {
        if &version.file_id != file_id {
            return false;
        }
    }
    if let Some(name) = &query.file_name {
        if !version.file_name.contains(name.as_str()) {
            return false;
        }
    }
    if let Some(number) = query.version {
        if version.version != number {
            return false;
        }
    }
    if let Some(created_by) = &query.created_by {
        if version.created_by.as_ref() != Some(created_by) {
            return false;
        }
    }
    if let Some(from) = query.date_from {
        if version.created_at < from {
            return false;
        }
    }
    if let Some(to) = query.date_to {
        if version.created_at > to {
            return false;
        }
    }
    if !query.tags.is_empty() && !query.tags.iter().any(|t| version.has_tag(t)) {
        return false;
    }
    true
}

/// Filter, sort and page `versions` according to `query`
pub fn run(versions: Vec<FileVersion>, query: &SearchQuery) -> Result<SearchResult> {
    validate(query)?;

    let mut matched: Vec<FileVersion> = versions.into_iter().filter(|v| matches(v, query)).collect();
    matched.sort_by(|a, b| {
        let ord = compare_by(a, b, query.sort_by);
        match query.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });

    let total = matched.len();
    let page: Vec<FileVersion> = matched
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();
    let has_more = query.offset.saturating_add(page.len()) < total;

    Ok(SearchResult {
        versions: page,
        total,
        has_more,
    })
}

fn compare_by(a: &FileVersion, b: &FileVersion, field: SortField) -> Ordering {
    match field {
        SortField::Version => a.version.cmp(&b.version),
        SortField::Size => a.size.cmp(&b.size),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
    }
}
