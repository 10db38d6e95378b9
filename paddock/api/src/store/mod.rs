use std::future::Future;

use bson::oid::ObjectId;

use self::memory::MemoryStore;
use self::mongo::MongoStore;
use crate::config::{DatabaseConfig, StoreKind};
use crate::database::{Child, Paddock, Step, System};

pub mod memory;
pub mod mongo;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
	#[error("mongodb: {0}")]
	Mongo(#[from] mongodb::error::Error),
	#[error("failed to encode document: {0}")]
	Encode(#[from] bson::ser::Error),
	#[error("failed to decode document: {0}")]
	Decode(#[from] bson::de::Error),
	#[error("connection string does not name a default database")]
	NoDefaultDatabase,
}

/// Outcome of removing an embedded child by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
	Removed,
	ParentMissing,
	ChildMissing,
}

/// Fields of a paddock an update replaces. `None` leaves the field as it is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaddockChanges {
	pub title: Option<String>,
	pub steps: Option<Vec<Step>>,
	pub systems: Option<Vec<System>>,
}

impl PaddockChanges {
	pub fn is_empty(&self) -> bool {
		self.title.is_none() && self.steps.is_none() && self.systems.is_none()
	}
}

/// Document store behind the API.
///
/// Every embedded list operation is a single atomic update, concurrent
/// appends to the same paddock never drop each other.
pub trait Store {
	/// All paddocks, in insertion order
	fn paddocks(&self) -> impl Future<Output = Result<Vec<Paddock>, StoreError>> + Send;

	fn paddock(&self, id: ObjectId) -> impl Future<Output = Result<Option<Paddock>, StoreError>> + Send;

	fn insert_paddock(&self, paddock: &Paddock) -> impl Future<Output = Result<(), StoreError>> + Send;

	/// Returns false if no paddock has this id
	fn update_paddock(
		&self,
		id: ObjectId,
		changes: &PaddockChanges,
	) -> impl Future<Output = Result<bool, StoreError>> + Send;

	/// Returns false if no paddock has this id
	fn delete_paddock(&self, id: ObjectId) -> impl Future<Output = Result<bool, StoreError>> + Send;

	/// Appends `child` to the paddock's list and returns the updated paddock
	fn push_child<C: Child>(
		&self,
		paddock_id: ObjectId,
		child: &C,
	) -> impl Future<Output = Result<Option<Paddock>, StoreError>> + Send;

	fn pull_child<C: Child>(
		&self,
		paddock_id: ObjectId,
		child_id: ObjectId,
	) -> impl Future<Output = Result<Removal, StoreError>> + Send;

	/// Drops the last child of the first paddock owned by `owner`. Returns
	/// false if the owner has no paddock, an empty list is left as is.
	fn pop_child<C: Child>(&self, owner: ObjectId) -> impl Future<Output = Result<bool, StoreError>> + Send;

	/// Standalone documents of one owner
	fn records<C: Child>(&self, owner: ObjectId) -> impl Future<Output = Result<Vec<C>, StoreError>> + Send;

	fn record<C: Child>(&self, id: ObjectId) -> impl Future<Output = Result<Option<C>, StoreError>> + Send;

	fn insert_record<C: Child>(&self, record: &C) -> impl Future<Output = Result<(), StoreError>> + Send;

	fn set_record_title<C: Child>(
		&self,
		id: ObjectId,
		title: &str,
	) -> impl Future<Output = Result<bool, StoreError>> + Send;

	fn delete_record<C: Child>(&self, id: ObjectId) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

#[derive(Debug)]
pub enum AnyStore {
	Mongo(MongoStore),
	Memory(MemoryStore),
}

impl Store for AnyStore {
	async fn paddocks(&self) -> Result<Vec<Paddock>, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.paddocks().await,
			AnyStore::Memory(store) => store.paddocks().await,
		}
	}

	async fn paddock(&self, id: ObjectId) -> Result<Option<Paddock>, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.paddock(id).await,
			AnyStore::Memory(store) => store.paddock(id).await,
		}
	}

	async fn insert_paddock(&self, paddock: &Paddock) -> Result<(), StoreError> {
		match self {
			AnyStore::Mongo(store) => store.insert_paddock(paddock).await,
			AnyStore::Memory(store) => store.insert_paddock(paddock).await,
		}
	}

	async fn update_paddock(&self, id: ObjectId, changes: &PaddockChanges) -> Result<bool, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.update_paddock(id, changes).await,
			AnyStore::Memory(store) => store.update_paddock(id, changes).await,
		}
	}

	async fn delete_paddock(&self, id: ObjectId) -> Result<bool, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.delete_paddock(id).await,
			AnyStore::Memory(store) => store.delete_paddock(id).await,
		}
	}

	async fn push_child<C: Child>(&self, paddock_id: ObjectId, child: &C) -> Result<Option<Paddock>, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.push_child(paddock_id, child).await,
			AnyStore::Memory(store) => store.push_child(paddock_id, child).await,
		}
	}

	async fn pull_child<C: Child>(&self, paddock_id: ObjectId, child_id: ObjectId) -> Result<Removal, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.pull_child::<C>(paddock_id, child_id).await,
			AnyStore::Memory(store) => store.pull_child::<C>(paddock_id, child_id).await,
		}
	}

	async fn pop_child<C: Child>(&self, owner: ObjectId) -> Result<bool, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.pop_child::<C>(owner).await,
			AnyStore::Memory(store) => store.pop_child::<C>(owner).await,
		}
	}

	async fn records<C: Child>(&self, owner: ObjectId) -> Result<Vec<C>, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.records(owner).await,
			AnyStore::Memory(store) => store.records(owner).await,
		}
	}

	async fn record<C: Child>(&self, id: ObjectId) -> Result<Option<C>, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.record(id).await,
			AnyStore::Memory(store) => store.record(id).await,
		}
	}

	async fn insert_record<C: Child>(&self, record: &C) -> Result<(), StoreError> {
		match self {
			AnyStore::Mongo(store) => store.insert_record(record).await,
			AnyStore::Memory(store) => store.insert_record(record).await,
		}
	}

	async fn set_record_title<C: Child>(&self, id: ObjectId, title: &str) -> Result<bool, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.set_record_title::<C>(id, title).await,
			AnyStore::Memory(store) => store.set_record_title::<C>(id, title).await,
		}
	}

	async fn delete_record<C: Child>(&self, id: ObjectId) -> Result<bool, StoreError> {
		match self {
			AnyStore::Mongo(store) => store.delete_record::<C>(id).await,
			AnyStore::Memory(store) => store.delete_record::<C>(id).await,
		}
	}
}

pub async fn build_store(config: &DatabaseConfig) -> Result<AnyStore, StoreError> {
	match config.kind {
		StoreKind::Mongo => Ok(AnyStore::Mongo(MongoStore::new(config).await?)),
		StoreKind::Memory => Ok(AnyStore::Memory(MemoryStore::new())),
	}
}
