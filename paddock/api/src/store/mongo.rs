use bson::oid::ObjectId;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};

use super::{PaddockChanges, Removal, Store, StoreError};
use crate::config::DatabaseConfig;
use crate::database::{now, Child, Paddock};

#[derive(Debug)]
pub struct MongoStore {
	database: Database,
}

impl MongoStore {
	#[tracing::instrument(skip(config), name = "MongoStore::new", err)]
	pub async fn new(config: &DatabaseConfig) -> Result<Self, StoreError> {
		tracing::debug!("setting up mongo client");

		let client = mongodb::Client::with_uri_str(&config.uri).await?;
		let database = client.default_database().ok_or(StoreError::NoDefaultDatabase)?;

		database.run_command(doc! { "ping": 1 }, None).await?;

		tracing::info!(database = database.name(), "connected to mongodb");

		Ok(Self { database })
	}

	fn paddock_collection(&self) -> Collection<Paddock> {
		self.database.collection(Paddock::COLLECTION)
	}

	fn record_collection<C: Child>(&self) -> Collection<C> {
		self.database.collection(C::COLLECTION)
	}
}

fn touch() -> Document {
	doc! { "updatedAt": bson::DateTime::from_chrono(now()) }
}

impl Store for MongoStore {
	#[tracing::instrument(skip(self), name = "MongoStore::paddocks", err)]
	async fn paddocks(&self) -> Result<Vec<Paddock>, StoreError> {
		Ok(self.paddock_collection().find(None, None).await?.try_collect().await?)
	}

	#[tracing::instrument(skip(self), name = "MongoStore::paddock", err)]
	async fn paddock(&self, id: ObjectId) -> Result<Option<Paddock>, StoreError> {
		Ok(self.paddock_collection().find_one(doc! { "_id": id }, None).await?)
	}

	#[tracing::instrument(skip(self, paddock), name = "MongoStore::insert_paddock", fields(id = %paddock.id), err)]
	async fn insert_paddock(&self, paddock: &Paddock) -> Result<(), StoreError> {
		self.paddock_collection().insert_one(paddock, None).await?;
		Ok(())
	}

	#[tracing::instrument(skip(self, changes), name = "MongoStore::update_paddock", err)]
	async fn update_paddock(&self, id: ObjectId, changes: &PaddockChanges) -> Result<bool, StoreError> {
		let mut set = touch();
		if let Some(title) = &changes.title {
			set.insert("title", title.as_str());
		}
		if let Some(steps) = &changes.steps {
			set.insert("steps", bson::to_bson(steps)?);
		}
		if let Some(systems) = &changes.systems {
			set.insert("systems", bson::to_bson(systems)?);
		}

		let result = self
			.paddock_collection()
			.update_one(doc! { "_id": id }, doc! { "$set": set }, None)
			.await?;

		Ok(result.matched_count > 0)
	}

	#[tracing::instrument(skip(self), name = "MongoStore::delete_paddock", err)]
	async fn delete_paddock(&self, id: ObjectId) -> Result<bool, StoreError> {
		let result = self.paddock_collection().delete_one(doc! { "_id": id }, None).await?;
		Ok(result.deleted_count > 0)
	}

	#[tracing::instrument(skip(self, child), name = "MongoStore::push_child", fields(field = C::FIELD, child = %child.id()), err)]
	async fn push_child<C: Child>(&self, paddock_id: ObjectId, child: &C) -> Result<Option<Paddock>, StoreError> {
		let mut push = Document::new();
		push.insert(C::FIELD, bson::to_bson(child)?);

		Ok(self
			.paddock_collection()
			.find_one_and_update(
				doc! { "_id": paddock_id },
				doc! { "$push": push, "$set": touch() },
				FindOneAndUpdateOptions::builder()
					.return_document(ReturnDocument::After)
					.build(),
			)
			.await?)
	}

	#[tracing::instrument(skip(self), name = "MongoStore::pull_child", fields(field = C::FIELD), err)]
	async fn pull_child<C: Child>(&self, paddock_id: ObjectId, child_id: ObjectId) -> Result<Removal, StoreError> {
		let mut filter = doc! { "_id": paddock_id };
		filter.insert(format!("{}._id", C::FIELD), child_id);

		let mut pull = Document::new();
		pull.insert(C::FIELD, doc! { "_id": child_id });

		let result = self
			.paddock_collection()
			.update_one(filter, doc! { "$pull": pull, "$set": touch() }, None)
			.await?;

		if result.matched_count > 0 {
			return Ok(Removal::Removed);
		}

		match self.paddock(paddock_id).await? {
			Some(_) => Ok(Removal::ChildMissing),
			None => Ok(Removal::ParentMissing),
		}
	}

	#[tracing::instrument(skip(self), name = "MongoStore::pop_child", fields(field = C::FIELD), err)]
	async fn pop_child<C: Child>(&self, owner: ObjectId) -> Result<bool, StoreError> {
		let mut pop = Document::new();
		pop.insert(C::FIELD, 1);

		let result = self
			.paddock_collection()
			.update_one(doc! { "owner": owner }, doc! { "$pop": pop, "$set": touch() }, None)
			.await?;

		Ok(result.matched_count > 0)
	}

	#[tracing::instrument(skip(self), name = "MongoStore::records", fields(collection = C::COLLECTION), err)]
	async fn records<C: Child>(&self, owner: ObjectId) -> Result<Vec<C>, StoreError> {
		Ok(self
			.record_collection::<C>()
			.find(doc! { "owner": owner }, None)
			.await?
			.try_collect()
			.await?)
	}

	#[tracing::instrument(skip(self), name = "MongoStore::record", fields(collection = C::COLLECTION), err)]
	async fn record<C: Child>(&self, id: ObjectId) -> Result<Option<C>, StoreError> {
		Ok(self.record_collection::<C>().find_one(doc! { "_id": id }, None).await?)
	}

	#[tracing::instrument(skip(self, record), name = "MongoStore::insert_record", fields(collection = C::COLLECTION, id = %record.id()), err)]
	async fn insert_record<C: Child>(&self, record: &C) -> Result<(), StoreError> {
		self.record_collection::<C>().insert_one(record, None).await?;
		Ok(())
	}

	#[tracing::instrument(skip(self), name = "MongoStore::set_record_title", fields(collection = C::COLLECTION), err)]
	async fn set_record_title<C: Child>(&self, id: ObjectId, title: &str) -> Result<bool, StoreError> {
		let mut set = touch();
		set.insert("title", title);

		let result = self
			.record_collection::<C>()
			.update_one(doc! { "_id": id }, doc! { "$set": set }, None)
			.await?;

		Ok(result.matched_count > 0)
	}

	#[tracing::instrument(skip(self), name = "MongoStore::delete_record", fields(collection = C::COLLECTION), err)]
	async fn delete_record<C: Child>(&self, id: ObjectId) -> Result<bool, StoreError> {
		let result = self.record_collection::<C>().delete_one(doc! { "_id": id }, None).await?;
		Ok(result.deleted_count > 0)
	}
}
