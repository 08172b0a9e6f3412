// src/handlers/users.rs

use axum::{extract::State, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::user::{ChatUser, NewChatUser},
};

// POST /api/users
#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = NewChatUser,
    responses(
        (status = 200, description = "Usuário registrado ou atualizado", body = ChatUser),
        (status = 400, description = "Dados inválidos")
    )
)]
pub async fn register_user(
    State(app_state): State<AppState>,
    Json(payload): Json<NewChatUser>,
) -> Result<Json<ChatUser>, AppError> {
    payload.validate()?;

    let user = app_state.user_service.register(&payload).await?;
    Ok(Json(user))
}
