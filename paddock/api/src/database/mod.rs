use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

mod paddock;
mod step;
mod system;

pub use paddock::Paddock;
pub use step::Step;
pub use system::System;

/// A document that is both stored in its own collection and embedded in a
/// paddock.
pub trait Child: Clone + Serialize + DeserializeOwned + Unpin + Send + Sync + 'static {
	/// Collection holding the standalone documents
	const COLLECTION: &'static str;
	/// Field of the paddock holding the embedded list
	const FIELD: &'static str;

	fn new(title: String, owner: Option<ObjectId>) -> Self;

	fn id(&self) -> ObjectId;

	fn owner(&self) -> Option<&ObjectId>;

	fn set_title(&mut self, title: &str, at: DateTime<Utc>);

	fn embedded_mut(paddock: &mut Paddock) -> &mut Vec<Self>;
}

/// The current time at the precision MongoDB stores, so a document compares
/// equal to itself after a round trip.
pub fn now() -> DateTime<Utc> {
	bson::DateTime::now().to_chrono()
}
