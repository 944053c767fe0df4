use crate::db::Store;
use crate::error::ServiceError;
use crate::orm::users;
use crate::permission::{Actor, Denial};
use crate::session::TokenKeys;
use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web::Data, Error, FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use sea_orm::EntityTrait;

/// Authenticated client passed to routes.
///
/// Extraction fails with 401 when the `Authorization: Bearer` credential is
/// missing, invalid, expired, or names a user that no longer exists or has
/// been deactivated. Handlers taking a `ClientCtx` therefore never run for
/// anonymous requests.
#[derive(Clone, Debug)]
pub struct ClientCtx(Actor);

impl ClientCtx {
    pub fn actor(&self) -> &Actor {
        &self.0
    }

    pub fn get_id(&self) -> i32 {
        self.0.id
    }

    /// Applies a route-level gate such as [`crate::permission::authorize_user_admin`].
    pub fn require(&self, gate: fn(&Actor) -> Result<(), Denial>) -> Result<(), ServiceError> {
        gate(&self.0).map_err(|_| {
            log::warn!(
                "User {} ({}) lacks the role for this route",
                self.0.id,
                self.0.role
            );
            ServiceError::Forbidden("Insufficient permissions".to_owned())
        })
    }
}

/// Reads the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim().to_owned())
    } else {
        None
    }
}

async fn resolve_actor(store: &Store, keys: &TokenKeys, token: &str) -> Result<Actor, ServiceError> {
    let claims = keys.verify(token)?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired token".to_owned()))?;

    let user = users::Entity::find_by_id(user_id)
        .one(store.conn())
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ServiceError::Unauthorized("User not found or inactive".to_owned()))?;

    // Role and email are read from the row, not the token.
    Ok(Actor::new(user.id, user.email, user.role))
}

/// This implementation is what actually provides the `client: ClientCtx` in the parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let store = req.app_data::<Data<Store>>().cloned();
        let keys = req.app_data::<Data<TokenKeys>>().cloned();

        Box::pin(async move {
            let (store, keys) = match (store, keys) {
                (Some(store), Some(keys)) => (store, keys),
                _ => {
                    return Err(ServiceError::Internal(
                        "Authentication data is not registered on the app".to_owned(),
                    )
                    .into())
                }
            };

            let token = token
                .ok_or_else(|| ServiceError::Unauthorized("Access token required".to_owned()))?;

            Ok(ClientCtx(resolve_actor(&store, &keys, &token).await?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_token_parsing() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def.ghi"));

        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert_eq!(bearer_token(&req), None);

        let req = TestRequest::default().to_http_request();
        assert_eq!(bearer_token(&req), None);
    }
}
