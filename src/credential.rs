use crate::error::ClientError;
use rocket::request::{FromRequest, Outcome};
use rocket::{async_trait, Request};
use std::convert::Infallible;

/// Bearer credential presented by the caller, if any.
///
/// The token shape is never checked here, only the upstream API decides if it
/// is valid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credential {
    presented: Option<String>,
}

impl Credential {
    pub fn new(token: Option<&str>) -> Self {
        Self {
            presented: non_empty(token),
        }
    }

    /// Parse an `Authorization` header value, only the `Bearer` scheme is
    /// accepted and it is matched case-insensitively
    pub fn from_authorization(header: Option<&str>) -> Self {
        Self::new(
            header
                .and_then(|h| h.trim_start().split_once(' '))
                .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
                .map(|(_, token)| token),
        )
    }

    /// Use `token` when nothing was presented yet
    pub fn or(self, token: Option<&str>) -> Self {
        match self.presented {
            Some(_) => self,
            None => Self::new(token),
        }
    }

    pub fn is_present(&self) -> bool {
        self.presented.is_some()
    }

    /// Final token, falling back to the configured default
    pub fn resolve(self, fallback: Option<&str>) -> Result<String, ClientError> {
        self.or(fallback)
            .presented
            .ok_or(ClientError::MissingCredential)
    }
}

fn non_empty(token: Option<&str>) -> Option<String> {
    token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl<'r> FromRequest<'r> for Credential {
    type Error = Infallible;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(Credential::from_authorization(
            request.headers().get_one("authorization"),
        ))
    }
}
