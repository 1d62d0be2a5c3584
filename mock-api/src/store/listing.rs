use payloads::{DEFAULT_PAGE_LIMIT, Page, PageMeta, SortOrder};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Parsed listing query. Unknown keys become equality filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ListParams {
    pub page: u32,
    pub limit: u32,
    pub sort_by: Option<String>,
    pub sort_order: SortOrder,
    pub search: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl ListParams {
    pub fn from_query(mut query: HashMap<String, String>) -> Self {
        let page = query
            .remove("page")
            .and_then(|p| p.parse().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);
        let limit = query
            .remove("limit")
            .and_then(|l| l.parse().ok())
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        let sort_by = query.remove("sortBy").filter(|s| !s.is_empty());
        let sort_order = match query.remove("sortOrder").as_deref() {
            Some(o) if o.eq_ignore_ascii_case("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        };
        let search = query
            .remove("search")
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let mut filters: Vec<_> =
            query.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        filters.sort();
        Self {
            page,
            limit,
            sort_by,
            sort_order,
            search,
            filters,
        }
    }
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(a), Some(b)) => field_text(a).cmp(&field_text(b)),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Filter, search, sort and paginate `items`.
///
/// Filters compare the textual form of top-level fields. `search` is a
/// case-insensitive substring match over `search_fields`. Filters naming
/// fields the item does not have are ignored.
pub fn list<T: Serialize + Clone>(
    items: &[T],
    params: &ListParams,
    search_fields: &[&str],
) -> Page<T> {
    let mut rows: Vec<(Value, &T)> = items
        .iter()
        .filter_map(|item| serde_json::to_value(item).ok().map(|v| (v, item)))
        .filter(|(value, _)| {
            params.filters.iter().all(|(key, wanted)| {
                match value.get(key).map(field_text) {
                    Some(Some(actual)) => actual.eq_ignore_ascii_case(wanted),
                    Some(None) => false,
                    None => true,
                }
            })
        })
        .filter(|(value, _)| {
            params.search.as_ref().is_none_or(|needle| {
                search_fields.iter().any(|field| {
                    value
                        .get(*field)
                        .and_then(field_text)
                        .is_some_and(|text| {
                            text.to_lowercase().contains(needle)
                        })
                })
            })
        })
        .collect();

    if let Some(sort_by) = &params.sort_by {
        rows.sort_by(|(a, _), (b, _)| {
            let ordering = compare(a.get(sort_by), b.get(sort_by));
            match params.sort_order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
    }

    let total = rows.len() as u64;
    let skip = (params.page as usize - 1) * params.limit as usize;
    let data = rows
        .into_iter()
        .skip(skip)
        .take(params.limit as usize)
        .map(|(_, item)| item.clone())
        .collect();
    Page {
        data,
        meta: PageMeta::new(params.page, params.limit, total),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::from_query(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn rows() -> Vec<Value> {
        (1..=23)
            .map(|n| {
                json!({
                    "id": n,
                    "codigo": format!("LV-{n:03}"),
                    "estado": if n % 2 == 0 { "activo" } else { "vencido" },
                })
            })
            .collect()
    }

    #[test]
    fn defaults_to_first_page_of_ten() {
        let page = list(&rows(), &params(&[]), &[]);
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.meta, PageMeta::new(1, 10, 23));
    }

    #[test]
    fn last_page_is_partial() {
        let page = list(&rows(), &params(&[("page", "3")]), &[]);
        assert_eq!(page.data.len(), 3);
        assert!(!page.meta.has_more());
    }

    #[test]
    fn filters_search_and_sort_compose() {
        let page = list(
            &rows(),
            &params(&[
                ("estado", "activo"),
                ("search", "lv-01"),
                ("sortBy", "id"),
                ("sortOrder", "DESC"),
            ]),
            &["codigo"],
        );
        let ids: Vec<_> = page.data.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(18), json!(16), json!(14), json!(12), json!(10)]);
    }
}
