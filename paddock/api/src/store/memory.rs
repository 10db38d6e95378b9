use std::collections::HashMap;

use bson::oid::ObjectId;
use bson::Document;
use tokio::sync::RwLock;

use super::{PaddockChanges, Removal, Store, StoreError};
use crate::database::{now, Child, Paddock};

#[derive(Debug, Default)]
struct Collections {
	paddocks: Vec<Paddock>,
	// Standalone child documents keyed by collection name, kept as BSON so
	// both child types share one map.
	records: HashMap<&'static str, Vec<Document>>,
}

impl Collections {
	fn paddock_mut(&mut self, id: ObjectId) -> Option<&mut Paddock> {
		self.paddocks.iter_mut().find(|paddock| paddock.id == id)
	}

	fn records<C: Child>(&self) -> impl Iterator<Item = Result<C, StoreError>> + '_ {
		self.records
			.get(C::COLLECTION)
			.into_iter()
			.flatten()
			.map(|doc| bson::from_document::<C>(doc.clone()).map_err(StoreError::from))
	}

	fn record_mut<C: Child>(&mut self, id: ObjectId) -> Option<&mut Document> {
		self.records
			.get_mut(C::COLLECTION)?
			.iter_mut()
			.find(|doc| doc.get_object_id("_id").ok() == Some(id))
	}
}

/// Store that keeps everything in process memory. Documents are cloned in and
/// out, and a single lock serializes every write.
#[derive(Debug, Default)]
pub struct MemoryStore {
	collections: RwLock<Collections>,
}

impl MemoryStore {
	pub fn new() -> Self {
		tracing::debug!("setting up memory store");
		Self::default()
	}
}

impl Store for MemoryStore {
	#[tracing::instrument(skip(self), name = "MemoryStore::paddocks", err)]
	async fn paddocks(&self) -> Result<Vec<Paddock>, StoreError> {
		Ok(self.collections.read().await.paddocks.clone())
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::paddock", err)]
	async fn paddock(&self, id: ObjectId) -> Result<Option<Paddock>, StoreError> {
		Ok(self
			.collections
			.read()
			.await
			.paddocks
			.iter()
			.find(|paddock| paddock.id == id)
			.cloned())
	}

	#[tracing::instrument(skip(self, paddock), name = "MemoryStore::insert_paddock", fields(id = %paddock.id), err)]
	async fn insert_paddock(&self, paddock: &Paddock) -> Result<(), StoreError> {
		self.collections.write().await.paddocks.push(paddock.clone());
		Ok(())
	}

	#[tracing::instrument(skip(self, changes), name = "MemoryStore::update_paddock", err)]
	async fn update_paddock(&self, id: ObjectId, changes: &PaddockChanges) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(paddock) = collections.paddock_mut(id) else {
			return Ok(false);
		};

		if let Some(title) = &changes.title {
			paddock.title = title.clone();
		}
		if let Some(steps) = &changes.steps {
			paddock.steps = steps.clone();
		}
		if let Some(systems) = &changes.systems {
			paddock.systems = systems.clone();
		}
		paddock.updated_at = now();

		Ok(true)
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::delete_paddock", err)]
	async fn delete_paddock(&self, id: ObjectId) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let before = collections.paddocks.len();
		collections.paddocks.retain(|paddock| paddock.id != id);
		Ok(collections.paddocks.len() != before)
	}

	#[tracing::instrument(skip(self, child), name = "MemoryStore::push_child", fields(field = C::FIELD, child = %child.id()), err)]
	async fn push_child<C: Child>(&self, paddock_id: ObjectId, child: &C) -> Result<Option<Paddock>, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(paddock) = collections.paddock_mut(paddock_id) else {
			return Ok(None);
		};

		C::embedded_mut(paddock).push(child.clone());
		paddock.updated_at = now();

		Ok(Some(paddock.clone()))
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::pull_child", fields(field = C::FIELD), err)]
	async fn pull_child<C: Child>(&self, paddock_id: ObjectId, child_id: ObjectId) -> Result<Removal, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(paddock) = collections.paddock_mut(paddock_id) else {
			return Ok(Removal::ParentMissing);
		};

		let children = C::embedded_mut(paddock);
		let before = children.len();
		children.retain(|child| child.id() != child_id);

		if children.len() == before {
			return Ok(Removal::ChildMissing);
		}

		paddock.updated_at = now();

		Ok(Removal::Removed)
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::pop_child", fields(field = C::FIELD), err)]
	async fn pop_child<C: Child>(&self, owner: ObjectId) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(paddock) = collections.paddocks.iter_mut().find(|paddock| paddock.owner == owner) else {
			return Ok(false);
		};

		C::embedded_mut(paddock).pop();
		paddock.updated_at = now();

		Ok(true)
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::records", fields(collection = C::COLLECTION), err)]
	async fn records<C: Child>(&self, owner: ObjectId) -> Result<Vec<C>, StoreError> {
		let collections = self.collections.read().await;

		let mut records = Vec::new();
		for record in collections.records::<C>() {
			let record = record?;
			if record.owner() == Some(&owner) {
				records.push(record);
			}
		}

		Ok(records)
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::record", fields(collection = C::COLLECTION), err)]
	async fn record<C: Child>(&self, id: ObjectId) -> Result<Option<C>, StoreError> {
		let collections = self.collections.read().await;

		for record in collections.records::<C>() {
			let record = record?;
			if record.id() == id {
				return Ok(Some(record));
			}
		}

		Ok(None)
	}

	#[tracing::instrument(skip(self, record), name = "MemoryStore::insert_record", fields(collection = C::COLLECTION, id = %record.id()), err)]
	async fn insert_record<C: Child>(&self, record: &C) -> Result<(), StoreError> {
		let document = bson::to_document(record)?;

		self.collections
			.write()
			.await
			.records
			.entry(C::COLLECTION)
			.or_default()
			.push(document);

		Ok(())
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::set_record_title", fields(collection = C::COLLECTION), err)]
	async fn set_record_title<C: Child>(&self, id: ObjectId, title: &str) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(document) = collections.record_mut::<C>(id) else {
			return Ok(false);
		};

		let mut record: C = bson::from_document(document.clone())?;
		record.set_title(title, now());
		*document = bson::to_document(&record)?;

		Ok(true)
	}

	#[tracing::instrument(skip(self), name = "MemoryStore::delete_record", fields(collection = C::COLLECTION), err)]
	async fn delete_record<C: Child>(&self, id: ObjectId) -> Result<bool, StoreError> {
		let mut collections = self.collections.write().await;
		let Some(records) = collections.records.get_mut(C::COLLECTION) else {
			return Ok(false);
		};

		let before = records.len();
		records.retain(|doc| doc.get_object_id("_id").ok() != Some(id));

		Ok(records.len() != before)
	}
}
