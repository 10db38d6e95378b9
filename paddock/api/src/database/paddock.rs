use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};

use super::{Step, System};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paddock {
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub title: String,
	#[serde(default)]
	pub steps: Vec<Step>,
	#[serde(default)]
	pub systems: Vec<System>,
	pub owner: ObjectId,
	#[serde(with = "chrono_datetime_as_bson_datetime")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "chrono_datetime_as_bson_datetime")]
	pub updated_at: DateTime<Utc>,
}

impl Paddock {
	pub const COLLECTION: &'static str = "paddocks";

	pub fn new(title: String, owner: ObjectId, steps: Vec<Step>, systems: Vec<System>) -> Self {
		let now = super::now();
		Self {
			id: ObjectId::new(),
			title,
			steps,
			systems,
			owner,
			created_at: now,
			updated_at: now,
		}
	}
}
