//! Caller context forwarded by the upstream gateway.
//!
//! Tokens are verified before requests reach this service; the gateway passes
//! the authenticated user in `X-User-Id`, `X-User-Role` and `X-User-Phone`.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use fleetward_core::domain::panic::PanicMetadata;
use fleetward_model::UserId;

use crate::infra::errors::AppError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const USER_PHONE_HEADER: &str = "x-user-phone";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub role: Option<String>,
    pub phone: Option<String>,
}

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let raw = header_text(&parts.headers, USER_ID_HEADER)
            .ok_or_else(|| AppError::unauthorized("Missing X-User-Id header"))?;
        let user_id = raw
            .parse::<UserId>()
            .map_err(|_| AppError::unauthorized("Invalid X-User-Id header"))?;

        Ok(Self {
            user_id,
            role: header_text(&parts.headers, USER_ROLE_HEADER),
            phone: header_text(&parts.headers, USER_PHONE_HEADER),
        })
    }
}

/// Network details recorded on audit rows. Never rejects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContext {
    pub ip_address: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientContext {
    pub fn into_panic_metadata(self, created_by: String) -> PanicMetadata {
        PanicMetadata {
            created_by,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
        }
    }
}

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());

        Ok(Self {
            ip_address: forwarded_for(&parts.headers).or(peer),
            user_agent: header_text(&parts.headers, header::USER_AGENT.as_str()),
        })
    }
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// First hop of `X-Forwarded-For`, when it parses as an address.
fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    header_text(headers, FORWARDED_FOR_HEADER)?
        .split(',')
        .next()
        .and_then(|hop| hop.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Request};

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/panic");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn identity_requires_a_valid_user_id() {
        let mut parts = parts_with(&[]);
        let err = CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNAUTHORIZED);

        let mut parts = parts_with(&[(USER_ID_HEADER, "not-a-uuid")]);
        assert!(
            CallerIdentity::from_request_parts(&mut parts, &())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn identity_reads_optional_headers() {
        let user = UserId::new();
        let user_header = user.to_string();
        let mut parts = parts_with(&[
            (USER_ID_HEADER, user_header.as_str()),
            (USER_ROLE_HEADER, "parent"),
            (USER_PHONE_HEADER, " +254700000100 "),
        ]);
        let identity = CallerIdentity::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(identity.user_id, user);
        assert_eq!(identity.role.as_deref(), Some("parent"));
        assert_eq!(identity.phone.as_deref(), Some("+254700000100"));
    }

    #[tokio::test]
    async fn forwarded_for_wins_over_peer_address() {
        let mut parts = parts_with(&[
            (FORWARDED_FOR_HEADER, "203.0.113.9, 10.0.0.1"),
            ("user-agent", "fleetward-app/2.1"),
        ]);
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 4000))));

        let client = ClientContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(client.ip_address, Some("203.0.113.9".parse::<IpAddr>().unwrap()));
        assert_eq!(client.user_agent.as_deref(), Some("fleetward-app/2.1"));
    }

    #[tokio::test]
    async fn peer_address_is_used_without_forwarding() {
        let mut parts = parts_with(&[(FORWARDED_FOR_HEADER, "garbage")]);
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 2], 4000))));
        parts
            .headers
            .insert(header::USER_AGENT, HeaderValue::from_static("  "));

        let client = ClientContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(client.ip_address, Some(IpAddr::from([10, 0, 0, 2])));
        assert_eq!(client.user_agent, None);
    }
}
