use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::utils::config::CONFIG;

const SESSION_HOURS: i64 = 12;

/// Rejoin credentials handed to a player when they join a room.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub room: String,
    pub exp: usize,
    pub iat: usize,
}

/// The authenticated player behind a request, taken from a verified token.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub player_id: String,
    pub room_id: String,
}

impl Session {
    /// A token only speaks for the room it was issued in.
    pub fn player_in(&self, room_id: &str) -> Result<&str, GameError> {
        if self.room_id != room_id {
            return Err(GameError::InvalidSession);
        }
        Ok(&self.player_id)
    }
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Session {
            player_id: claims.sub,
            room_id: claims.room,
        }
    }
}

pub fn create_token(player_id: &str, room_id: &str) -> Result<String, GameError> {
    let now = Utc::now();
    let claims = Claims {
        sub: player_id.to_string(),
        room: room_id.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(SESSION_HOURS)).timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(CONFIG.session_secret.as_bytes()),
    )
    .map_err(|e| GameError::Internal(format!("failed to sign session token: {}", e)))
}

pub fn verify_token(token: &str) -> Result<Claims, GameError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(CONFIG.session_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| GameError::InvalidSession)?;

    Ok(token_data.claims)
}
