use bson::oid::ObjectId;
use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};

use super::{Child, Paddock};

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
	#[serde(rename = "_id")]
	pub id: ObjectId,
	pub title: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub owner: Option<ObjectId>,
	#[serde(with = "chrono_datetime_as_bson_datetime")]
	pub created_at: DateTime<Utc>,
	#[serde(with = "chrono_datetime_as_bson_datetime")]
	pub updated_at: DateTime<Utc>,
}

impl Child for Step {
	const COLLECTION: &'static str = "steps";
	const FIELD: &'static str = "steps";

	fn new(title: String, owner: Option<ObjectId>) -> Self {
		let now = super::now();
		Self {
			id: ObjectId::new(),
			title,
			owner,
			created_at: now,
			updated_at: now,
		}
	}

	fn id(&self) -> ObjectId {
		self.id
	}

	fn owner(&self) -> Option<&ObjectId> {
		self.owner.as_ref()
	}

	fn set_title(&mut self, title: &str, at: DateTime<Utc>) {
		self.title = title.to_string();
		self.updated_at = at;
	}

	fn embedded_mut(paddock: &mut Paddock) -> &mut Vec<Self> {
		&mut paddock.steps
	}
}
