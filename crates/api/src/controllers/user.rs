//! `/user` CRUD endpoints.
//!
//! Every route requires an authenticated admin (`["auth", "role:admin"]`).
//! Write endpoints include the request's correlation id in their body.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use userhub_core::UserId;
use userhub_routing::{Controller, RouteTable, RoutingError};
use userhub_users::{CreateUserRequest, UpdateUserRequest, UserService};

use crate::context::RequestId;
use crate::errors::ApiError;

const ADMIN_ONLY: [&str; 2] = ["auth", "role:admin"];

pub struct UserController {
    users: UserService,
}

impl UserController {
    async fn index(self: Arc<Self>, _req: Request) -> Result<Json<Value>, ApiError> {
        let users = self.users.list_users().await?;
        success(None, users)
    }

    async fn show(self: Arc<Self>, req: Request) -> Result<Json<Value>, ApiError> {
        let (id, _) = user_id(req).await?;
        let user = self.users.get_user(id).await?;
        success(None, user)
    }

    async fn store(self: Arc<Self>, req: Request) -> Result<Json<Value>, ApiError> {
        let request_id = req.extensions().get::<RequestId>().cloned();
        let payload: CreateUserRequest = json_body(req).await?;
        let user = self.users.create_user(payload.validate()?).await?;
        success(request_id, user)
    }

    async fn update(self: Arc<Self>, req: Request) -> Result<Json<Value>, ApiError> {
        let (id, req) = user_id(req).await?;
        let request_id = req.extensions().get::<RequestId>().cloned();
        let payload: UpdateUserRequest = json_body(req).await?;
        let user = self.users.update_user(id, payload.validate()?).await?;
        success(request_id, user)
    }

    async fn delete(self: Arc<Self>, req: Request) -> Result<Json<Value>, ApiError> {
        let (id, req) = user_id(req).await?;
        let request_id = req.extensions().get::<RequestId>().cloned();
        let user = self.users.delete_user(id).await?;
        success(request_id, user)
    }
}

impl Controller for UserController {
    type Context = UserService;

    fn create(users: &UserService) -> anyhow::Result<Self> {
        Ok(Self {
            users: users.clone(),
        })
    }

    fn routes() -> Result<RouteTable<Self>, RoutingError> {
        let mut table = RouteTable::new();
        table
            .handler("index", Self::index)
            .handler("show", Self::show)
            .handler("store", Self::store)
            .handler("update", Self::update)
            .handler("delete", Self::delete);

        table.get("/user", "index")?.middleware("index", ADMIN_ONLY)?;
        table.get("/user/:id", "show")?.middleware("show", ADMIN_ONLY)?;
        table.post("/user", "store")?.middleware("store", ADMIN_ONLY)?;
        table.put("/user/:id", "update")?.middleware("update", ADMIN_ONLY)?;
        table.delete("/user/:id", "delete")?.middleware("delete", ADMIN_ONLY)?;
        Ok(table)
    }
}

fn success(request_id: Option<RequestId>, data: impl Serialize) -> Result<Json<Value>, ApiError> {
    let data = serde_json::to_value(data)
        .map_err(|e| ApiError::Internal(anyhow::Error::new(e).context("failed to serialize response")))?;
    Ok(match request_id {
        Some(id) => Json(json!({ "requestId": id.as_str(), "message": "Success", "data": data })),
        None => Json(json!({ "message": "Success", "data": data })),
    })
}

/// Pull `:id` out of the matched path; hands the request back for further extraction.
async fn user_id(req: Request) -> Result<(UserId, Request), ApiError> {
    let (mut parts, body) = req.into_parts();
    let Path(raw) = Path::<String>::from_request_parts(&mut parts, &())
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;
    let id = raw
        .parse::<UserId>()
        .map_err(|_| ApiError::bad_request(format!("invalid user id '{raw}'")))?;
    Ok((id, Request::from_parts(parts, body)))
}

async fn json_body<T: DeserializeOwned>(req: Request) -> Result<T, ApiError> {
    let Json(payload) = Json::<T>::from_request(req, &())
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?;
    Ok(payload)
}
