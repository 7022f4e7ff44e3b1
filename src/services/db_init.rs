use mongodb::{
    bson::{doc, Document},
    options::IndexOptions,
    Database, IndexModel,
};

use crate::{error::Result, store::mongo};

pub async fn ensure_indexes(db: &Database) -> Result<()> {
    // users: unique username
    {
        let col = db.collection::<Document>(mongo::USERS);
        let model = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    // news_items: url is the dedup key
    {
        let col = db.collection::<Document>(mongo::NEWS_ITEMS);
        let model = IndexModel::builder()
            .keys(doc! { "url": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;

        let by_time = IndexModel::builder().keys(doc! { "timestamp": -1 }).build();
        col.create_index(by_time, None).await?;
    }

    // integrations: one per (user_id, provider)
    {
        let col = db.collection::<Document>(mongo::INTEGRATIONS);
        let model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "provider": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        col.create_index(model, None).await?;
    }

    Ok(())
}
