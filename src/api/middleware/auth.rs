//! Token authentication
//!
//! `Authorization: Token <key>` 头存在时解析出当前用户并放入请求扩展；
//! 头不存在时按匿名请求继续，令牌无效时直接返回 401。

use std::rc::Rc;
use std::sync::Arc;

use actix_service::{Service, Transform};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    body::EitherBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    web,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{debug, trace};

use crate::api::services::helpers::error_from_foodgram;
use crate::errors::FoodgramError;
use crate::services::UserService;

use migration::entities::user;

/// 认证方案前缀
const TOKEN_PREFIX: &str = "Token ";

/// 已认证的用户，存放在请求扩展中
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

/// Token authentication middleware
#[derive(Clone)]
pub struct TokenAuth;

impl<S, B> Transform<S, ServiceRequest> for TokenAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = TokenAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct TokenAuthMiddleware<S> {
    service: Rc<S>,
}

/// 从 Authorization header 提取令牌；其他认证方案视为未提供
fn extract_token(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(TOKEN_PREFIX))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl<S, B> Service<ServiceRequest> for TokenAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let Some(token) = extract_token(&req) else {
                trace!("Anonymous request: {}", req.path());
                return srv.call(req).await.map(|res| res.map_into_left_body());
            };

            let users = req.app_data::<web::Data<Arc<UserService>>>().cloned();
            let found = match users {
                Some(users) => users.authenticate(&token).await,
                None => Err(FoodgramError::database_config("UserService is not registered")),
            };

            match found {
                Ok(Some(user)) => {
                    trace!("Authenticated user {}", user.id);
                    req.extensions_mut().insert(CurrentUser(user));
                    srv.call(req).await.map(|res| res.map_into_left_body())
                }
                Ok(None) => {
                    debug!("Invalid token on {}", req.path());
                    let resp = error_from_foodgram(&FoodgramError::unauthorized("Invalid token"));
                    Ok(req.into_response(resp).map_into_right_body())
                }
                Err(e) => {
                    let resp = error_from_foodgram(&e);
                    Ok(req.into_response(resp).map_into_right_body())
                }
            }
        })
    }
}

/// 必须登录的处理函数参数
#[derive(Clone, Debug)]
pub struct AuthUser(pub user::Model);

impl FromRequest for AuthUser {
    type Error = FoodgramError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .map(|current| AuthUser(current.0.clone()))
                .ok_or_else(|| {
                    FoodgramError::unauthorized("Authentication credentials were not provided")
                }),
        )
    }
}

/// 可匿名访问的处理函数参数
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<user::Model>);

impl MaybeUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequest for MaybeUser {
    type Error = FoodgramError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MaybeUser(
            req.extensions()
                .get::<CurrentUser>()
                .map(|current| current.0.clone()),
        )))
    }
}
