//! MongoDB exerciser: one document per iteration, then drop the collection.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use mongodb::bson::{doc, Document};
use mongodb::Client;

use crate::config::BackendKind;
use crate::exercise::{Budget, ExerciseError, Exerciser, LOAD_TARGET};

/// Collection written to in the URI's database (or `load_demo` if the URI names none).
const COLLECTION: &str = "demo";

pub struct MongoExerciser {
    url: String,
    teardown: bool,
}

impl MongoExerciser {
    pub fn new(url: impl Into<String>, teardown: bool) -> Self {
        Self {
            url: url.into(),
            teardown,
        }
    }

    async fn exercise(&self, budget: &Budget) -> Result<u64, ExerciseError> {
        let client = Client::with_uri_str(&self.url).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(LOAD_TARGET));
        let collection = database.collection::<Document>(COLLECTION);

        let mut writes = 0;
        while budget.allows(writes) {
            collection.insert_one(doc! { "i": writes as i64 }).await?;
            writes += 1;
        }

        if self.teardown {
            collection.drop().await?;
        }

        client.shutdown().await;
        Ok(writes)
    }
}

impl Exerciser for MongoExerciser {
    fn kind(&self) -> BackendKind {
        BackendKind::Mongodb
    }

    fn run(&self, budget: Arc<Budget>) -> BoxFuture<'_, Result<u64, ExerciseError>> {
        Box::pin(async move { self.exercise(&budget).await })
    }
}
