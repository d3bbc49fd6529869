use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde_json::Value;
use tracing::debug;

use super::LiveSource;
use crate::dataset::Record;
use crate::error::{ConsoleError, Result};

/// Full scan of one document collection.
pub struct MongoSource {
    collection: Collection<Document>,
    label: String,
}

impl MongoSource {
    /// Build the client. No round trip happens until the first fetch.
    pub async fn connect(uri: &str, database: &str, collection: &str, timeout: Duration) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some("autos-console".to_string());
        options.server_selection_timeout = Some(timeout);
        options.connect_timeout = Some(timeout);
        let client = Client::with_options(options)?;

        debug!(database, collection, "mongo client configured");
        Ok(Self {
            collection: client.database(database).collection(collection),
            label: format!("{}.{}.find({{}})", database, collection),
        })
    }
}

#[async_trait]
impl LiveSource for MongoSource {
    fn id(&self) -> &str {
        "mongo"
    }

    fn query(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<Record>> {
        let cursor = self.collection.find(doc! {}).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs.into_iter().map(document_to_record).collect())
    }
}

/// Relaxed extended JSON, with an ObjectId `_id` flattened to its hex form.
fn document_to_record(mut document: Document) -> Record {
    if let Ok(oid) = document.get_object_id("_id") {
        document.insert("_id", Bson::String(oid.to_hex()));
    }
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        other => {
            let mut record = Record::new();
            record.insert("value".to_string(), other);
            record
        }
    }
}
