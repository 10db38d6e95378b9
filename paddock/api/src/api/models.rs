//! JSON shapes of the API: the views documents are rendered as and the
//! schemas request bodies must match.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use common::http::ext::ResultExt;
use hyper::StatusCode;
use serde::de::IgnoredAny;

use super::auth::AuthData;
use super::error::{ApiError, Result};
use crate::database::{Child, Paddock, Step, System};
use crate::store::PaddockChanges;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildModel {
	#[serde(rename = "_id")]
	pub id: String,
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub owner: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

macro_rules! impl_child_model {
	($($ty:ty),*) => {
		$(
			impl From<$ty> for ChildModel {
				fn from(value: $ty) -> Self {
					Self {
						id: value.id.to_hex(),
						title: value.title,
						owner: value.owner.map(|owner| owner.to_hex()),
						created_at: value.created_at,
						updated_at: value.updated_at,
					}
				}
			}
		)*
	};
}

impl_child_model!(Step, System);

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaddockModel {
	#[serde(rename = "_id")]
	pub id: String,
	pub title: String,
	pub steps: Vec<ChildModel>,
	pub systems: Vec<ChildModel>,
	pub owner: String,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<Paddock> for PaddockModel {
	fn from(value: Paddock) -> Self {
		Self {
			id: value.id.to_hex(),
			title: value.title,
			steps: value.steps.into_iter().map(Into::into).collect(),
			systems: value.systems.into_iter().map(Into::into).collect(),
			owner: value.owner.to_hex(),
			created_at: value.created_at,
			updated_at: value.updated_at,
		}
	}
}

/// `{ "paddock": ... }`
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaddockBody<T> {
	pub paddock: T,
}

/// `{ "step": ... }`
#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepBody<T> {
	pub step: T,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewChild {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub owner: Option<String>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPaddock {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub owner: Option<String>,
	#[serde(default)]
	pub steps: Vec<NewChild>,
	#[serde(default)]
	pub systems: Vec<NewChild>,
}

/// Partial update of a step. Only the title can change, an `owner` is
/// accepted so clients may send it back but it is never applied.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentPatch {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub owner: Option<IgnoredAny>,
}

/// Partial update of a paddock. A given `steps` or `systems` list replaces
/// the embedded one, the owner is never applied.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaddockPatch {
	#[serde(default)]
	pub title: Option<String>,
	#[serde(default)]
	pub owner: Option<IgnoredAny>,
	#[serde(default)]
	pub steps: Option<Vec<NewChild>>,
	#[serde(default)]
	pub systems: Option<Vec<NewChild>>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendSteps {
	pub steps: NewChild,
}

#[derive(Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendSystems {
	pub systems: NewChild,
}

/// Empty strings count as absent.
fn non_blank(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.is_empty())
}

#[track_caller]
fn require_title(title: Option<String>) -> Result<String> {
	match non_blank(title) {
		Some(title) if !title.trim().is_empty() => Ok(title),
		_ => Err((StatusCode::UNPROCESSABLE_ENTITY, "title is required", ApiError::Validation("title is required")).into()),
	}
}

#[track_caller]
fn parse_owner(owner: Option<String>) -> Result<Option<ObjectId>> {
	non_blank(owner)
		.map(|owner| ObjectId::parse_str(owner).map_err_route((StatusCode::UNPROCESSABLE_ENTITY, "invalid owner")))
		.transpose()
}

impl NewChild {
	/// Without an owner in the body an authenticated caller becomes the
	/// owner, an anonymous one leaves it unset.
	pub fn into_child<C: Child>(self, caller: Option<&AuthData>) -> Result<C> {
		let title = require_title(self.title)?;
		let owner = parse_owner(self.owner)?.or(caller.map(|caller| caller.user_id));

		Ok(C::new(title, owner))
	}
}

impl NewPaddock {
	/// Builds the paddock to insert. Without an owner in the body the caller
	/// becomes the owner.
	pub fn into_paddock(self, caller: Option<&AuthData>) -> Result<Paddock> {
		let title = require_title(self.title)?;

		let owner = match parse_owner(self.owner)? {
			Some(owner) => owner,
			None => match caller {
				Some(caller) => caller.user_id,
				None => {
					return Err((StatusCode::UNPROCESSABLE_ENTITY, "owner is required", ApiError::Validation("owner is required")).into());
				}
			},
		};

		let steps = self
			.steps
			.into_iter()
			.map(|step| step.into_child(caller))
			.collect::<Result<Vec<Step>>>()?;
		let systems = self
			.systems
			.into_iter()
			.map(|system| system.into_child(caller))
			.collect::<Result<Vec<System>>>()?;

		Ok(Paddock::new(title, owner, steps, systems))
	}
}

fn patched_title(title: Option<String>) -> Result<Option<String>> {
	match non_blank(title) {
		Some(title) => require_title(Some(title)).map(Some),
		None => Ok(None),
	}
}

impl DocumentPatch {
	/// The title to apply, if any.
	pub fn title(self) -> Result<Option<String>> {
		patched_title(self.title)
	}
}

impl PaddockPatch {
	/// New children get the same owner fallback as on creation.
	pub fn into_changes(self, caller: Option<&AuthData>) -> Result<PaddockChanges> {
		let steps = self
			.steps
			.map(|steps| steps.into_iter().map(|step| step.into_child(caller)).collect::<Result<Vec<Step>>>())
			.transpose()?;
		let systems = self
			.systems
			.map(|systems| {
				systems
					.into_iter()
					.map(|system| system.into_child(caller))
					.collect::<Result<Vec<System>>>()
			})
			.transpose()?;

		Ok(PaddockChanges {
			title: patched_title(self.title)?,
			steps,
			systems,
		})
	}
}
