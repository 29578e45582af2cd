//! User entity - Students who register, get verified by an admin and place orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Student account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique across students
    #[sea_orm(unique)]
    pub email: String,
    /// Institutional identifier (PNR)
    pub pnr: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Path of the uploaded ID photo, relative to the uploads root
    pub id_photo_path: Option<String>,
    /// Login is refused until an admin verifies the account
    pub verified: bool,
    /// When the account was registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
