//! Database access handle.
//!
//! A [`Store`] is built once at startup and handed to every service that
//! needs it. Clones share the same connection pool. Call [`Store::close`]
//! after the HTTP server has stopped to drain the pool.

use crate::orm::{apartments, buildings, comments, complaints, users};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Store {
    conn: DatabaseConnection,
}

impl Store {
    /// Opens a pool against `url` (`postgres://…` or `sqlite://…`).
    pub async fn connect(url: &str) -> Result<Self, DbErr> {
        let mut options = ConnectOptions::new(url.to_owned());
        options
            .max_connections(16)
            .connect_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let conn = Database::connect(options).await?;
        log::info!("Connected to {:?} database", conn.get_database_backend());

        Ok(Self { conn })
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Creates any missing table from the entity definitions, parents first.
    pub async fn ensure_schema(&self) -> Result<(), DbErr> {
        self.create_table(users::Entity).await?;
        self.create_table(buildings::Entity).await?;
        self.create_table(apartments::Entity).await?;
        self.create_table(complaints::Entity).await?;
        self.create_table(comments::Entity).await?;
        Ok(())
    }

    async fn create_table<E: EntityTrait>(&self, entity: E) -> Result<(), DbErr> {
        let backend = self.conn.get_database_backend();
        let mut statement = Schema::new(backend).create_table_from_entity(entity);
        statement.if_not_exists();

        self.conn.execute(backend.build(&statement)).await?;
        Ok(())
    }

    /// Drains and closes the pool.
    pub async fn close(self) -> Result<(), DbErr> {
        log::info!("Closing database pool");
        self.conn.close().await
    }
}
