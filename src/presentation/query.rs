// Raw query-string parsing; filters use repeated keys (fy=..&fy=..)
use crate::domain::period::PeriodFilter;

/// Split `a=1&a=2&b=x+y` into ordered, percent-decoded pairs.
/// Undecodable pairs are dropped.
pub fn parse_query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            let key = decode(key)?;
            let value = decode(value)?;
            Some((key, value))
        })
        .collect()
}

fn decode(component: &str) -> Option<String> {
    let spaced = component.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Some(decoded.into_owned()),
        Err(e) => {
            tracing::debug!("Dropping undecodable query component {:?}: {}", component, e);
            None
        }
    }
}

/// Canonical string for a period filter, stable across key order and duplicates
pub fn period_cache_key(period: &PeriodFilter) -> String {
    period
        .query_pairs()
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_keys_and_decoding() {
        let pairs = parse_query_pairs(Some("fy=2024-25&fy=2023-24&status=UNDER%20INSTALLATION&x=a+b&flag"));
        assert_eq!(
            pairs,
            vec![
                ("fy".to_string(), "2024-25".to_string()),
                ("fy".to_string(), "2023-24".to_string()),
                ("status".to_string(), "UNDER INSTALLATION".to_string()),
                ("x".to_string(), "a b".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(parse_query_pairs(None).is_empty());
        assert!(parse_query_pairs(Some("")).is_empty());
    }

    #[test]
    fn test_period_cache_key_is_canonical() {
        let a = PeriodFilter::from_query(&parse_query_pairs(Some("quarter=Q2&fy=2024-25&quarter=Q1")));
        let b = PeriodFilter::from_query(&parse_query_pairs(Some("fy=2024-25&quarter=Q1&quarter=Q2&quarter=Q1")));
        assert_eq!(period_cache_key(&a), period_cache_key(&b));
        assert_eq!(period_cache_key(&a), "fy=2024-25&quarter=Q1&quarter=Q2");
        assert_eq!(period_cache_key(&PeriodFilter::new()), "");
    }
}
