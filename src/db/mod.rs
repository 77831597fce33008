use std::time::Duration;

use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Collection,
};

use crate::{config::Config, errors::AppResult};

const APP_NAME: &str = "pass-quiz-server";

/// Handle on the service database; cheap to clone.
#[derive(Clone)]
pub struct Database {
    client: Client,
    db_name: String,
}

async fn client_options(conn_string: &str) -> AppResult<ClientOptions> {
    let mut options = ClientOptions::parse(conn_string).await?;

    options.app_name = Some(APP_NAME.to_string());
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.max_pool_size = Some(10);
    options.min_pool_size = Some(2);
    options.connect_timeout = Some(Duration::from_secs(5));
    options.server_selection_timeout = Some(Duration::from_secs(5));
    Ok(options)
}

impl Database {
    /// Connects and pings the server so a bad connection string fails at
    /// startup rather than on the first request.
    pub async fn connect(config: &Config) -> AppResult<Self> {
        let client = Client::with_options(client_options(&config.mongo_conn_string).await?)?;
        let database = Self {
            client,
            db_name: config.mongo_db_name.clone(),
        };

        database.health_check().await?;
        log::info!("Connected to MongoDB database '{}'", database.db_name);
        Ok(database)
    }

    pub fn get_collection<T>(&self, collection_name: &str) -> Collection<T>
    where
        T: Send + Sync,
    {
        self.client
            .database(&self.db_name)
            .collection(collection_name)
    }

    pub async fn health_check(&self) -> AppResult<()> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }
}
