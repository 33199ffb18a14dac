//! Query string encoding for list operations.

use ensync_api_models::ListParams;

/// Filters accepted by `GET /event`.
pub(crate) const EVENT_FILTERS: &[&str] = &[];
/// Filters accepted by `GET /access-key`.
pub(crate) const ACCESS_KEY_FILTERS: &[&str] = &["accessKey"];

/// Encode pagination and sort fields plus the declared filters that carry a
/// non-empty value. Undeclared filter keys are dropped.
pub(crate) fn list_query(params: &ListParams, declared_filters: &[&str]) -> Vec<(String, String)> {
    let mut query = vec![
        ("pageIndex".to_string(), params.page_index.to_string()),
        ("limit".to_string(), params.limit.to_string()),
        ("order".to_string(), params.order.as_str().to_string()),
        ("orderBy".to_string(), params.order_by.as_str().to_string()),
    ];
    for key in declared_filters {
        if let Some(value) = params.filter.get(*key).filter(|value| !value.is_empty()) {
            query.push(((*key).to_string(), value.clone()));
        }
    }
    query
}
