use std::sync::Arc;

use bson::oid::ObjectId;
use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
#[cfg(test)]
use jwt::{RegisteredClaims, SignWithKey};
use jwt::{Claims, Header, Token, VerifyWithKey};
use sha2::Sha256;

use crate::config::JwtConfig;
use crate::global::ApiGlobal;

/// Claims of a bearer token. The subject is the hex id of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthJwtPayload {
	pub user_id: ObjectId,
	pub expiration: Option<DateTime<Utc>>,
	pub issued_at: DateTime<Utc>,
	pub not_before: Option<DateTime<Utc>>,
}

fn timestamp(secs: u64) -> Option<DateTime<Utc>> {
	Utc.timestamp_opt(i64::try_from(secs).ok()?, 0).single()
}

fn signing_key(config: &JwtConfig) -> Option<Hmac<Sha256>> {
	Hmac::<Sha256>::new_from_slice(config.secret.as_bytes()).ok()
}

pub trait JwtState: Sized {
	// Tokens are minted by the identity service, this side only verifies
	// them. Issuing is kept for tests.
	#[cfg(test)]
	fn to_claims(&self) -> Claims;

	fn from_claims(claims: &Claims) -> Option<Self>;

	#[cfg(test)]
	fn serialize<G: ApiGlobal>(&self, global: &Arc<G>) -> Option<String> {
		let config = global.config::<JwtConfig>();

		let mut claims = self.to_claims();
		claims.registered.issuer = Some(config.issuer.clone());

		if claims.registered.issued_at.is_none() {
			claims.registered.issued_at = Some(Utc::now().timestamp() as u64);
		}

		claims.sign_with_key(&signing_key(config)?).ok()
	}

	/// Checks the signature, the issuer and the time claims. `iat` is
	/// required, `nbf` and `exp` only apply when present.
	fn verify<G: ApiGlobal>(global: &Arc<G>, token: &str) -> Option<Self> {
		let config = global.config::<JwtConfig>();

		let token: Token<Header, Claims, _> = token.verify_with_key(&signing_key(config)?).ok()?;
		let claims = token.claims();

		if claims.registered.issuer.as_ref() != Some(&config.issuer) {
			return None;
		}

		let now = Utc::now();

		if timestamp(claims.registered.issued_at?)? > now {
			return None;
		}

		if claims.registered.not_before.and_then(timestamp).is_some_and(|nbf| nbf > now) {
			return None;
		}

		if claims.registered.expiration.and_then(timestamp).is_some_and(|exp| exp < now) {
			return None;
		}

		Self::from_claims(claims)
	}
}

impl JwtState for AuthJwtPayload {
	#[cfg(test)]
	fn to_claims(&self) -> Claims {
		Claims {
			registered: RegisteredClaims {
				issuer: None,
				subject: Some(self.user_id.to_hex()),
				audience: None,
				expiration: self.expiration.map(|x| x.timestamp() as u64),
				not_before: self.not_before.map(|x| x.timestamp() as u64),
				issued_at: Some(self.issued_at.timestamp() as u64),
				json_web_token_id: None,
			},
			private: Default::default(),
		}
	}

	fn from_claims(claims: &Claims) -> Option<Self> {
		Some(Self {
			user_id: ObjectId::parse_str(claims.registered.subject.as_ref()?).ok()?,
			expiration: claims.registered.expiration.and_then(timestamp),
			issued_at: timestamp(claims.registered.issued_at?)?,
			not_before: claims.registered.not_before.and_then(timestamp),
		})
	}
}

#[cfg(test)]
impl AuthJwtPayload {
	pub fn new(user_id: ObjectId) -> Self {
		Self {
			user_id,
			expiration: None,
			issued_at: timestamp(Utc::now().timestamp() as u64).unwrap_or_else(Utc::now),
			not_before: None,
		}
	}
}
