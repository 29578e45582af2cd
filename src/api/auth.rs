//! Login, logout and student registration.

use super::{
    AppState,
    response::{ApiResponse, done, ok},
    session::SessionToken,
};
use crate::{
    core::{
        access::Role,
        auth::{self, PhotoUpload, Registration},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(alias = "user_type")]
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub role: Role,
    pub id: i64,
    pub name: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>> {
    let principal = auth::login(&state.db, request.role, &request.email, &request.password).await?;
    let response = LoginResponse {
        role: principal.role,
        id: principal.id,
        name: principal.name.clone(),
        token: state.sessions.create(principal).await,
    };
    Ok(ok("Login successful", response))
}

pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Json<ApiResponse<()>> {
    state.sessions.remove(&token).await;
    done("Logged out")
}

#[derive(Debug, Serialize)]
pub struct Registered {
    pub user_id: i64,
}

fn multipart_error(e: impl std::fmt::Display) -> Error {
    Error::validation(format!("Invalid registration form: {e}"))
}

/// Multipart fields: `name`, `email`, `pnr`, `password` and an optional
/// `id_photo` file.
pub async fn register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<Registered>>)> {
    let mut form = Registration {
        name: String::new(),
        email: String::new(),
        pnr: String::new(),
        password: String::new(),
    };
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(ToString::to_string) else {
            continue;
        };
        match name.as_str() {
            "id_photo" => {
                let original_filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !original_filename.is_empty() {
                    photo = Some(PhotoUpload {
                        original_filename,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "name" => form.name = field.text().await.map_err(multipart_error)?,
            "email" => form.email = field.text().await.map_err(multipart_error)?,
            "pnr" => form.pnr = field.text().await.map_err(multipart_error)?,
            "password" => form.password = field.text().await.map_err(multipart_error)?,
            _ => {}
        }
    }

    let account = auth::register(&state.db, &state.settings.uploads_root, form, photo).await?;
    info!(user_id = account.id, "registration received");
    Ok((
        StatusCode::CREATED,
        ok(
            "Registration successful! Wait for admin verification.",
            Registered {
                user_id: account.id,
            },
        ),
    ))
}
