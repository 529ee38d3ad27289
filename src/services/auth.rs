use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use model::entities::{invalid_token, shop, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::JwtConfig;
use crate::error::{ApiError, ApiResult};

/// Birth dates travel as `dd/mm/yyyy`.
pub const BIRTH_DATE_FORMAT: &str = "%d/%m/%Y";
pub const INVALID_CREDENTIALS: &str = "Invalid phone number or password";

/// JWT payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: i32,
    pub no_telp: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

pub fn hash_password(plain: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("password hashing failed: {}", e);
            ApiError::internal("Failed to hash password")
        })
}

pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("stored password hash is malformed: {}", e);
            false
        }
    }
}

pub fn parse_birth_date(raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, BIRTH_DATE_FORMAT)
            .map(Some)
            .map_err(|_| ApiError::bad_request("tanggal_lahir: This field must use dd/mm/yyyy")),
    }
}

pub fn issue_token(config: &JwtConfig, account: &user::Model) -> ApiResult<(String, DateTime<Utc>)> {
    let now = Utc::now();
    let expires = now + Duration::minutes(config.expire_in_minutes);
    let claims = Claims {
        id: account.id,
        no_telp: account.notelp.clone(),
        is_admin: account.is_admin,
        iat: now.timestamp(),
        exp: expires.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret_key.as_bytes()),
    )
    .map_err(|e| {
        error!("failed to sign token: {}", e);
        ApiError::internal("Failed to issue token")
    })?;

    Ok((token, expires))
}

pub fn decode_token(config: &JwtConfig, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret_key.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

/// Profile fields accepted at registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub nama: String,
    pub kata_sandi: String,
    pub no_telp: String,
    pub tanggal_lahir: Option<NaiveDate>,
    pub jenis_kelamin: Option<String>,
    pub tentang: Option<String>,
    pub pekerjaan: Option<String>,
    pub email: String,
    pub id_provinsi: Option<String>,
    pub id_kota: Option<String>,
    pub is_admin: bool,
}

/// Creates the account and its shop in one transaction.
pub async fn register(db: &DatabaseConnection, account: NewAccount) -> ApiResult<user::Model> {
    let taken = user::Entity::find()
        .filter(user::Column::Notelp.eq(&account.no_telp))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(ApiError::conflict("Phone number is already registered"));
    }

    let kata_sandi = hash_password(&account.kata_sandi)?;
    let txn = db.begin().await?;

    let created = user::ActiveModel {
        nama: Set(account.nama.clone()),
        kata_sandi: Set(kata_sandi),
        notelp: Set(account.no_telp),
        tanggal_lahir: Set(account.tanggal_lahir),
        jenis_kelamin: Set(account.jenis_kelamin),
        tentang: Set(account.tentang),
        pekerjaan: Set(account.pekerjaan),
        email: Set(account.email),
        id_provinsi: Set(account.id_provinsi),
        id_kota: Set(account.id_kota),
        is_admin: Set(account.is_admin),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    shop::ActiveModel {
        id_user: Set(created.id),
        nama_toko: Set(account.nama),
        url_foto: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(user_id = created.id, "registered new account");
    Ok(created)
}

pub async fn login(
    db: &DatabaseConnection,
    config: &JwtConfig,
    no_telp: &str,
    kata_sandi: &str,
) -> ApiResult<(String, DateTime<Utc>)> {
    let account = user::Entity::find()
        .filter(user::Column::Notelp.eq(no_telp))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::warn(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS))?;

    if !verify_password(kata_sandi, &account.kata_sandi) {
        debug!(user_id = account.id, "password mismatch");
        return Err(ApiError::warn(StatusCode::UNAUTHORIZED, INVALID_CREDENTIALS));
    }

    issue_token(config, &account)
}

/// Puts `token` on the blocklist until `expires`, dropping rows that have
/// already lapsed.
pub async fn revoke_token(db: &DatabaseConnection, token: &str, expires: i64) -> ApiResult<()> {
    let expires = Utc
        .timestamp_opt(expires, 0)
        .single()
        .ok_or_else(|| ApiError::bad_request("token expiry is out of range"))?;

    invalid_token::Entity::delete_many()
        .filter(invalid_token::Column::Expires.lt(Utc::now()))
        .exec(db)
        .await?;

    invalid_token::ActiveModel {
        token: Set(token.to_string()),
        expires: Set(expires),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn is_revoked(db: &DatabaseConnection, token: &str) -> ApiResult<bool> {
    let hit = invalid_token::Entity::find()
        .filter(invalid_token::Column::Token.eq(token))
        .one(db)
        .await?;
    Ok(hit.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret_key: "test-secret".to_string(),
            expire_in_minutes: 5,
        }
    }

    fn account() -> user::Model {
        user::Model {
            id: 7,
            nama: "Budi".into(),
            kata_sandi: String::new(),
            notelp: "0812".into(),
            tanggal_lahir: None,
            jenis_kelamin: None,
            tentang: None,
            pekerjaan: None,
            email: "budi@mail.test".into(),
            id_provinsi: None,
            id_kota: None,
            is_admin: true,
            created_at_date: Utc::now(),
            updated_at_date: Utc::now(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("rahasia").unwrap();
        assert_ne!(hash, "rahasia");
        assert!(verify_password("rahasia", &hash));
        assert!(!verify_password("salah", &hash));
        assert!(!verify_password("rahasia", "not-a-phc-string"));
    }

    #[test]
    fn token_carries_id_and_admin_flag() {
        let config = jwt_config();
        let (token, expires) = issue_token(&config, &account()).unwrap();
        let claims = decode_token(&config, &token).unwrap();
        assert_eq!(claims.id, 7);
        assert!(claims.is_admin);
        assert_eq!(claims.exp, expires.timestamp());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = issue_token(&jwt_config(), &account()).unwrap();
        let other = JwtConfig {
            secret_key: "other".into(),
            expire_in_minutes: 5,
        };
        assert!(decode_token(&other, &token).is_err());
    }

    #[test]
    fn birth_date_uses_day_first_format() {
        assert_eq!(
            parse_birth_date(Some("17/08/1995")).unwrap(),
            NaiveDate::from_ymd_opt(1995, 8, 17)
        );
        assert_eq!(parse_birth_date(None).unwrap(), None);
        assert!(parse_birth_date(Some("1995-08-17")).is_err());
    }
}
