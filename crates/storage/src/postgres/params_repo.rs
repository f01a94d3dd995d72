//! Singleton parameter repository for PostgreSQL.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgQueryResult;
use tracing::{debug, instrument};

use gavel_core::error::{StorageError, StorageResult};
use gavel_core::metrics::{record_rows_written, record_stale_write};
use gavel_core::models::{
    DepositParams, EMoneyGasPrices, GovParams, Height, IcsParams, InterchainStakingParams,
    TallyParams, VotingParams,
};
use gavel_core::ports::ParamsRepository;

use super::helpers::{DbDecCoin, dec_coins_to_db, singleton_upsert_sql, to_db_int};

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct GovParamsRow {
    deposit_params: Value,
    voting_params: Value,
    tally_params: Value,
    height: i64,
}

impl GovParamsRow {
    fn into_params(self) -> StorageResult<GovParams> {
        Ok(GovParams {
            deposit_params: serde_json::from_value::<DepositParams>(self.deposit_params)?,
            voting_params: serde_json::from_value::<VotingParams>(self.voting_params)?,
            tally_params: serde_json::from_value::<TallyParams>(self.tally_params)?,
            height: self.height as Height,
        })
    }
}

#[derive(sqlx::FromRow)]
struct InterchainStakingParamsRow {
    params: Value,
    height: i64,
}

impl InterchainStakingParamsRow {
    fn into_params(self) -> StorageResult<InterchainStakingParams> {
        Ok(InterchainStakingParams {
            params: serde_json::from_value::<IcsParams>(self.params)?,
            height: self.height as Height,
        })
    }
}

#[derive(sqlx::FromRow)]
struct GasPricesRow {
    gas_prices: Vec<DbDecCoin>,
    height: i64,
}

impl GasPricesRow {
    fn into_prices(self) -> EMoneyGasPrices {
        EMoneyGasPrices {
            gas_prices: self.gas_prices.into_iter().map(Into::into).collect(),
            height: self.height as Height,
        }
    }
}

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of ParamsRepository.
///
/// Each category lives in a one-row table. Writes are a single conditional
/// upsert, so concurrent writers never interleave a read and a write.
pub struct PgParamsRepository {
    pool: PgPool,
}

impl PgParamsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Count the write, or the suppression when the height guard rejected it.
fn record_upsert(entity: &'static str, height: Height, result: &PgQueryResult) {
    record_rows_written(entity, 1);
    if result.rows_affected() == 0 {
        debug!(entity, height, "Stale write ignored by height guard");
        record_stale_write(entity);
    }
}

#[async_trait]
impl ParamsRepository for PgParamsRepository {
    #[instrument(skip_all, fields(height = params.height))]
    async fn save_gov_params(&self, params: &GovParams) -> StorageResult<()> {
        let height = to_db_int(params.height, "height")?;
        let deposit_params = serde_json::to_value(&params.deposit_params)?;
        let voting_params = serde_json::to_value(&params.voting_params)?;
        let tally_params = serde_json::to_value(&params.tally_params)?;

        let sql = singleton_upsert_sql(
            "gov_params",
            &["deposit_params", "voting_params", "tally_params"],
        );
        let result = sqlx::query(&sql)
            .bind(deposit_params)
            .bind(voting_params)
            .bind(tally_params)
            .bind(height)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        record_upsert("gov_params", params.height, &result);
        Ok(())
    }

    async fn get_gov_params(&self) -> StorageResult<Option<GovParams>> {
        let row = sqlx::query_as::<_, GovParamsRow>(
            r#"
            SELECT deposit_params, voting_params, tally_params, height
            FROM gov_params
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(GovParamsRow::into_params).transpose()
    }

    #[instrument(skip_all, fields(height = params.height))]
    async fn save_interchain_staking_params(
        &self,
        params: &InterchainStakingParams,
    ) -> StorageResult<()> {
        let height = to_db_int(params.height, "height")?;
        let payload = serde_json::to_value(&params.params)?;

        let sql = singleton_upsert_sql("interchain_staking_params", &["params"]);
        let result = sqlx::query(&sql)
            .bind(payload)
            .bind(height)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        record_upsert("interchain_staking_params", params.height, &result);
        Ok(())
    }

    async fn get_interchain_staking_params(&self) -> StorageResult<Option<InterchainStakingParams>> {
        let row = sqlx::query_as::<_, InterchainStakingParamsRow>(
            "SELECT params, height FROM interchain_staking_params",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        row.map(InterchainStakingParamsRow::into_params).transpose()
    }

    #[instrument(skip_all, fields(height = prices.height, denoms = prices.gas_prices.len()))]
    async fn save_emoney_gas_prices(&self, prices: &EMoneyGasPrices) -> StorageResult<()> {
        let height = to_db_int(prices.height, "height")?;
        let sql = singleton_upsert_sql("emoney_gas_prices", &["gas_prices"]);
        let result = sqlx::query(&sql)
            .bind(dec_coins_to_db(&prices.gas_prices))
            .bind(height)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryError(e.to_string()))?;

        record_upsert("emoney_gas_prices", prices.height, &result);
        Ok(())
    }

    async fn get_emoney_gas_prices(&self) -> StorageResult<Option<EMoneyGasPrices>> {
        let row = sqlx::query_as::<_, GasPricesRow>(
            "SELECT gas_prices, height FROM emoney_gas_prices",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryError(e.to_string()))?;

        Ok(row.map(GasPricesRow::into_prices))
    }
}
