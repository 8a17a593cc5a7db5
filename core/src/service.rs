//! Query service — cache-or-compute orchestration over the aggregate
//! store.
//!
//! One method per aggregate, no business logic beyond shape translation.
//! The service owns the cache (created at process start, dropped at exit,
//! nothing persisted) and a store handle; there is no global state.

use crate::{
    cache::ResultCache,
    error::AnalyticsResult,
    store::{ActivityStore, FailureRate, KycFunnel, MonthlyActive, ProductAdoption, TopMerchant},
};
use serde::{de::DeserializeOwned, Serialize};

pub struct QueryService {
    store: ActivityStore,
    cache: ResultCache,
}

impl QueryService {
    pub fn new(store: ActivityStore) -> Self {
        Self {
            store,
            cache: ResultCache::new(),
        }
    }

    /// Route one named aggregate through the cache. Results live in the
    /// cache as JSON values, so a hit deserializes back into the typed
    /// shape.
    fn cached<T, F>(&self, name: &str, compute: F) -> AnalyticsResult<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&ActivityStore) -> AnalyticsResult<T>,
    {
        let value = self.cache.get_or_compute(name, || {
            let computed = compute(&self.store)?;
            Ok(serde_json::to_value(computed)?)
        })?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn top_merchant(&self) -> AnalyticsResult<TopMerchant> {
        self.cached("top_merchant", ActivityStore::top_merchant)
    }

    pub fn monthly_active_merchants(&self) -> AnalyticsResult<MonthlyActive> {
        self.cached("monthly_active", ActivityStore::monthly_active_merchants)
    }

    pub fn product_adoption(&self) -> AnalyticsResult<Vec<ProductAdoption>> {
        self.cached("product_adoption", ActivityStore::product_adoption)
    }

    pub fn kyc_funnel(&self) -> AnalyticsResult<KycFunnel> {
        self.cached("kyc_funnel", ActivityStore::kyc_funnel)
    }

    pub fn failure_rates(&self) -> AnalyticsResult<Vec<FailureRate>> {
        self.cached("failure_rates", ActivityStore::failure_rates)
    }
}
