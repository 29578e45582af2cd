//! Authentication and account lifecycle.
//!
//! Login checks exactly one of the three principal tables, chosen by the role
//! the caller claims. Students additionally need an admin-verified account.
//! Every failure collapses into [`Error::InvalidCredentials`] so callers
//! cannot tell an unknown email from a wrong password or a pending account.

use crate::{
    core::{
        access::{Capability, Principal, Role, authorize},
        password::{hash_password, verify_password},
    },
    entities::{Admin, KitchenStaff, User, admin, kitchen_staff, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, SqlErr, prelude::*};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Upload size limit for ID photos.
pub const MAX_PHOTO_BYTES: usize = 2 * 1024 * 1024;

/// Accepted ID photo extensions.
pub const ALLOWED_PHOTO_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Sub-directory of the uploads root holding ID photos.
pub const ID_PROOF_DIR: &str = "id_proofs";

/// Verifies credentials against the table for `role`.
///
/// # Errors
/// Returns [`Error::InvalidCredentials`] for unknown emails, wrong passwords
/// and unverified student accounts alike.
#[instrument(skip(db, password))]
pub async fn login(
    db: &DatabaseConnection,
    role: Role,
    email: &str,
    password: &str,
) -> Result<Principal> {
    let email = email.trim();
    let account = match role {
        Role::Admin => Admin::find()
            .filter(admin::Column::Email.eq(email))
            .one(db)
            .await?
            .map(|a| (a.id, a.name, a.password_hash)),
        Role::Kitchen => KitchenStaff::find()
            .filter(kitchen_staff::Column::Email.eq(email))
            .one(db)
            .await?
            .map(|k| (k.id, k.name, k.password_hash)),
        Role::Student => User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::Verified.eq(true))
            .one(db)
            .await?
            .map(|u| (u.id, u.name, u.password_hash)),
    };

    match account {
        Some((id, name, hash)) if verify_password(password, &hash) => {
            info!(%role, id, "login succeeded");
            Ok(Principal::new(role, id, name))
        }
        _ => {
            warn!(%role, "login failed");
            Err(Error::InvalidCredentials)
        }
    }
}

/// Registration form data.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub pnr: String,
    pub password: String,
}

/// An uploaded ID photo, not yet written to disk.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// File name as sent by the browser, used only for its extension
    pub original_filename: String,
    pub bytes: Vec<u8>,
}

/// Registers a new, unverified student account.
///
/// The optional photo is written under `uploads_root/id_proofs/` first; if
/// the insert then fails the file is removed again.
///
/// # Errors
/// Returns an error if:
/// - Any field is empty
/// - The photo has a disallowed extension or exceeds [`MAX_PHOTO_BYTES`]
/// - The email is already registered ([`Error::DuplicateEmail`])
/// - The database or filesystem operation fails
#[instrument(skip(db, registration, photo), fields(email = %registration.email))]
pub async fn register(
    db: &DatabaseConnection,
    uploads_root: &Path,
    registration: Registration,
    photo: Option<PhotoUpload>,
) -> Result<user::Model> {
    let name = registration.name.trim().to_string();
    let email = registration.email.trim().to_string();
    let pnr = registration.pnr.trim().to_string();

    if name.is_empty() || email.is_empty() || pnr.is_empty() || registration.password.is_empty() {
        return Err(Error::validation(
            "Name, email, PNR and password are required.",
        ));
    }

    let photo_path = match photo {
        Some(upload) if !upload.bytes.is_empty() => {
            Some(store_id_photo(uploads_root, &pnr, &name, &upload).await?)
        }
        _ => None,
    };

    let password_hash = hash_password(&registration.password)?;
    let new_user = user::ActiveModel {
        name: Set(name),
        email: Set(email.clone()),
        pnr: Set(pnr),
        password_hash: Set(password_hash),
        id_photo_path: Set(photo_path.clone()),
        verified: Set(false),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    match new_user.insert(db).await {
        Ok(model) => {
            info!(user_id = model.id, "registered new user pending verification");
            Ok(model)
        }
        Err(err) => {
            if let Some(rel) = &photo_path {
                remove_photo(uploads_root, rel).await;
            }
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                Err(Error::DuplicateEmail { email })
            } else {
                Err(err.into())
            }
        }
    }
}

/// Lists accounts awaiting verification, oldest first.
pub async fn pending_verifications(
    db: &DatabaseConnection,
    principal: &Principal,
) -> Result<Vec<user::Model>> {
    authorize(principal, Capability::VerifyUsers)?;
    User::find()
        .filter(user::Column::Verified.eq(false))
        .order_by_asc(user::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Marks a student account as verified so it can log in.
#[instrument(skip(db, principal))]
pub async fn verify_user(
    db: &DatabaseConnection,
    principal: &Principal,
    user_id: i64,
) -> Result<user::Model> {
    authorize(principal, Capability::VerifyUsers)?;

    let mut account: user::ActiveModel = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { user_id })?
        .into();

    account.verified = Set(true);
    let updated = account.update(db).await?;
    info!(user_id, "user verified");
    Ok(updated)
}

/// Deletes a pending student account and its ID photo.
///
/// Verified accounts are refused so their order history stays intact.
#[instrument(skip(db, principal))]
pub async fn reject_user(
    db: &DatabaseConnection,
    principal: &Principal,
    uploads_root: &Path,
    user_id: i64,
) -> Result<()> {
    authorize(principal, Capability::VerifyUsers)?;

    let account = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { user_id })?;
    if account.verified {
        warn!(user_id, "refused to reject a verified account");
        return Err(Error::validation("Only pending accounts can be rejected."));
    }

    let photo = account.id_photo_path.clone();
    account.delete(db).await?;

    if let Some(rel) = photo {
        remove_photo(uploads_root, &rel).await;
    }

    info!(user_id, "user rejected and removed");
    Ok(())
}

/// Inserts a seeded admin unless the email already exists. Returns true if inserted.
pub async fn seed_admin(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> Result<bool> {
    let exists = Admin::find()
        .filter(admin::Column::Email.eq(email))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }

    admin::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(true)
}

/// Inserts a seeded kitchen account unless the email already exists. Returns true if inserted.
pub async fn seed_kitchen_staff(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
) -> Result<bool> {
    let exists = KitchenStaff::find()
        .filter(kitchen_staff::Column::Email.eq(email))
        .one(db)
        .await?
        .is_some();
    if exists {
        return Ok(false);
    }

    kitchen_staff::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(true)
}

/// Returns the lowercase extension if it is an allowed image type.
#[must_use]
pub fn allowed_photo_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_PHOTO_EXTENSIONS
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Reduces a file name to ASCII letters, digits, `-`, `_` and `.`.
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    cleaned.trim_start_matches(['.', '_']).to_string()
}

async fn store_id_photo(
    uploads_root: &Path,
    pnr: &str,
    name: &str,
    upload: &PhotoUpload,
) -> Result<String> {
    let ext = allowed_photo_extension(&upload.original_filename)
        .ok_or_else(|| Error::validation("ID photo must be a PNG, JPG or GIF image."))?;
    if upload.bytes.len() > MAX_PHOTO_BYTES {
        return Err(Error::validation("ID photo must be 2 MB or smaller."));
    }

    let filename = sanitize_filename(&format!(
        "{pnr}_{name}_{}.{ext}",
        Uuid::new_v4().simple()
    ));
    let dir = uploads_root.join(ID_PROOF_DIR);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&filename), &upload.bytes).await?;

    Ok(format!("{ID_PROOF_DIR}/{filename}"))
}

/// Resolves a stored relative photo path under `uploads_root`.
///
/// Backslashes and a leading `uploads/` or `/` are tolerated; anything that
/// would escape the root is rejected.
#[must_use]
pub fn resolve_photo_path(uploads_root: &Path, relative: &str) -> Option<PathBuf> {
    let normalized = normalize_photo_path(relative);
    if normalized.is_empty() || normalized.split('/').any(|part| part == "..") {
        return None;
    }
    Some(uploads_root.join(normalized))
}

/// Normalizes a stored photo path to `id_proofs/<file>` form.
#[must_use]
pub fn normalize_photo_path(relative: &str) -> String {
    let unified = relative.replace('\\', "/");
    let trimmed = unified.trim_start_matches('/');
    trimmed
        .strip_prefix("uploads/")
        .unwrap_or(trimmed)
        .to_string()
}

async fn remove_photo(uploads_root: &Path, relative: &str) {
    let Some(path) = resolve_photo_path(uploads_root, relative) else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove ID photo {}: {}", path.display(), e);
        }
    }
}
