//! SurrealDB implementation of [`CountryRepository`].
//!
//! Country rows are seeded by migration and never written at runtime.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use identra_core::error::IdentraResult;
use identra_core::models::country::Country;
use identra_core::repository::CountryRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CountryRow {
    code: String,
    name: String,
}

impl CountryRow {
    fn into_country(self) -> Country {
        Country {
            code: self.code,
            name: self.name,
        }
    }
}

/// SurrealDB implementation of the country reference-data repository.
pub struct SurrealCountryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealCountryRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealCountryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CountryRepository for SurrealCountryRepository<C> {
    async fn list(&self) -> IdentraResult<Vec<Country>> {
        let mut result = self
            .db
            .query("SELECT * FROM country ORDER BY code ASC")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountryRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().map(CountryRow::into_country).collect())
    }

    async fn get_by_code(&self, code: &str) -> IdentraResult<Country> {
        let mut result = self
            .db
            .query("SELECT * FROM country WHERE code = $code")
            .bind(("code", code.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "country".into(),
            id: code.to_string(),
        })?;

        Ok(row.into_country())
    }
}
