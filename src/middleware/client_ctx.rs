use crate::orm::users;
use crate::session::{authenticate_by_token, parse_bearer};
use crate::web::error::ApiError;
use actix_web::dev::{self, Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header;
use actix_web::{web::Data, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sea_orm::DatabaseConnection;
use std::rc::Rc;

/// Who is calling, resolved once per request from the `Authorization` header.
#[derive(Clone, Debug, Default)]
pub struct ClientCtxInner {
    /// User data. Optional. None is an anonymous caller.
    pub client: Option<users::Model>,
    /// Bearer token the user authenticated with.
    pub token: Option<String>,
}

impl ClientCtxInner {
    /// Resolves the bearer token, if any, to a user.
    pub async fn from_token(db: Option<&DatabaseConnection>, token: Option<String>) -> Self {
        let (db, token) = match (db, token) {
            (Some(db), Some(token)) => (db, token),
            (None, Some(_)) => {
                log::error!("No database connection registered; treating request as anonymous");
                return Self::default();
            }
            (_, None) => return Self::default(),
        };

        match authenticate_by_token(db, &token).await {
            Ok(Some(user)) => Self {
                client: Some(user),
                token: Some(token),
            },
            Ok(None) => Self::default(),
            Err(e) => {
                log::error!("Unable to authenticate bearer token: {}", e);
                Self::default()
            }
        }
    }
}

/// Handler-facing view of [`ClientCtxInner`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct ClientCtx(Data<ClientCtxInner>);

impl Default for ClientCtx {
    fn default() -> Self {
        Self(Data::new(ClientCtxInner::default()))
    }
}

impl ClientCtx {
    /// The context the middleware stored, or an anonymous one for routes
    /// reached without it.
    fn from_extensions(extensions: &Extensions) -> Self {
        extensions
            .get::<Data<ClientCtxInner>>()
            .cloned()
            .map(Self)
            .unwrap_or_default()
    }

    pub fn get_id(&self) -> Option<i32> {
        self.0.client.as_ref().map(|u| u.id)
    }

    pub fn get_user(&self) -> Option<&users::Model> {
        self.0.client.as_ref()
    }

    pub fn get_token(&self) -> Option<&str> {
        self.0.token.as_deref()
    }

    pub fn is_staff(&self) -> bool {
        self.0.client.as_ref().map_or(false, |u| u.is_staff)
    }

    /// Require user to be logged in. Returns user_id or Unauthorized.
    pub fn require_login(&self) -> Result<i32, ApiError> {
        self.get_id().ok_or(ApiError::Unauthorized)
    }

    /// Require a logged in user and return it.
    pub fn require_user(&self) -> Result<&users::Model, ApiError> {
        self.get_user().ok_or(ApiError::Unauthorized)
    }

    /// Require staff status. Anonymous callers get Unauthorized, others Forbidden.
    pub fn require_staff(&self) -> Result<i32, ApiError> {
        let user_id = self.require_login()?;
        if !self.is_staff() {
            return Err(ApiError::Forbidden);
        }
        Ok(user_id)
    }

    /// Require ownership of a resource. Returns () or Forbidden.
    pub fn require_ownership(&self, resource_user_id: i32) -> Result<(), ApiError> {
        let user_id = self.require_login()?;
        if user_id == resource_user_id {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

/// Lets handlers take `client: ClientCtx` as an argument.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(Self::from_extensions(&req.extensions())))
    }
}

impl<S: 'static, B> Transform<S, ServiceRequest> for ClientCtx
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ClientCtxMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ClientCtxMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct ClientCtxMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ClientCtxMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .map(str::to_owned);

        let db = req.app_data::<Data<DatabaseConnection>>().cloned();

        Box::pin(async move {
            let inner = ClientCtxInner::from_token(db.as_ref().map(|db| db.get_ref()), token).await;
            req.extensions_mut().insert(Data::new(inner));
            service.call(req).await
        })
    }
}
