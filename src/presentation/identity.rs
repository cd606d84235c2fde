// Caller identity from gateway-asserted headers
use crate::domain::role::{Role, UserIdentity};
use crate::presentation::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_NAME_HEADER: &str = "x-user-name";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn identity_from_headers(headers: &HeaderMap) -> Result<UserIdentity, ApiError> {
    let id = header_str(headers, USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(USER_ID_HEADER.to_string()))?
        .parse::<i64>()
        .map_err(|_| ApiError::Unauthenticated(USER_ID_HEADER.to_string()))?;

    let role = header_str(headers, USER_ROLE_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(USER_ROLE_HEADER.to_string()))?
        .parse::<Role>()
        .map_err(ApiError::Unauthenticated)?;

    Ok(UserIdentity {
        id,
        role,
        name: header_str(headers, USER_NAME_HEADER).map(str::to_string),
    })
}

/// Extractor wrapper so handlers can take the caller as an argument
pub struct CurrentUser(pub UserIdentity);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_headers(&parts.headers).map(CurrentUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_valid_identity() {
        let identity = identity_from_headers(&headers(&[
            (USER_ID_HEADER, "10"),
            (USER_ROLE_HEADER, "sales"),
            (USER_NAME_HEADER, "Asha"),
        ]))
        .unwrap();

        assert_eq!(identity.id, 10);
        assert_eq!(identity.role, Role::Sales);
        assert_eq!(identity.name.as_deref(), Some("Asha"));
    }

    #[test]
    fn test_missing_or_invalid_headers() {
        assert!(matches!(
            identity_from_headers(&headers(&[(USER_ROLE_HEADER, "ADMIN")])),
            Err(ApiError::Unauthenticated(_))
        ));
        assert!(matches!(
            identity_from_headers(&headers(&[(USER_ID_HEADER, "abc"), (USER_ROLE_HEADER, "ADMIN")])),
            Err(ApiError::Unauthenticated(_))
        ));
        assert!(matches!(
            identity_from_headers(&headers(&[(USER_ID_HEADER, "1"), (USER_ROLE_HEADER, "JANITOR")])),
            Err(ApiError::Unauthenticated(_))
        ));
    }
}
