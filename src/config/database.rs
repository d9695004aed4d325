//! Database configuration module.
//!
//! Handles the SeaORM connection and table creation. Tables are generated from
//! the entity definitions with `Schema::create_table_from_entity`, so the
//! schema always matches the Rust structs without hand-written SQL.

use crate::entities::{
    AdminUser, AdmissionPeriod, Contact, Gallery, News, Registration, SchoolProfile, Session,
    Skill,
};
use crate::errors::Result;
use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, instrument};

/// Used when neither config.toml nor `DATABASE_URL` names a database.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/portal.sqlite?mode=rwc";

/// Establishes a connection to the configured database.
#[instrument]
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database");
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so foreign keys resolve.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut tables: Vec<TableCreateStatement> = vec![
        schema.create_table_from_entity(SchoolProfile),
        schema.create_table_from_entity(Skill),
        schema.create_table_from_entity(News),
        schema.create_table_from_entity(Gallery),
        schema.create_table_from_entity(Contact),
        schema.create_table_from_entity(AdmissionPeriod),
        schema.create_table_from_entity(Registration),
        schema.create_table_from_entity(AdminUser),
        schema.create_table_from_entity(Session),
    ];

    for table in &mut tables {
        table.if_not_exists();
        db.execute(builder.build(&*table)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NewsModel, RegistrationModel, SessionModel, SkillModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        let _: Vec<SkillModel> = Skill::find().limit(1).all(&db).await?;
        let _: Vec<NewsModel> = News::find().limit(1).all(&db).await?;
        let _: Vec<RegistrationModel> = Registration::find().limit(1).all(&db).await?;
        let _: Vec<SessionModel> = Session::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
