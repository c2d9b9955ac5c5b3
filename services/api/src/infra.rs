use kilimo_kredo::config::{ProviderConfig, StorageConfig};
use kilimo_kredo::error::AppError;
use kilimo_kredo::lending::{
    CropType, JsonFileStore, KeyValueStore, LendingService, MemoryStore, RandomConfidence,
    RetryingProvider, ScoringEngine, StoreApplicationRepository, StoreProfileRepository,
    SyntheticEnvironmentProvider,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type EnvironmentProvider = RetryingProvider<SyntheticEnvironmentProvider>;

pub(crate) type ApiLendingService = LendingService<
    StoreProfileRepository<dyn KeyValueStore>,
    StoreApplicationRepository<dyn KeyValueStore>,
    EnvironmentProvider,
>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// File-backed when a data directory is configured, otherwise process-local.
pub(crate) fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, AppError> {
    match &config.data_dir {
        Some(dir) => Ok(Arc::new(JsonFileStore::open(dir)?)),
        None => Ok(Arc::new(MemoryStore::default())),
    }
}

pub(crate) fn environment_provider(config: &ProviderConfig) -> EnvironmentProvider {
    let synthetic = match config.seed {
        Some(seed) => SyntheticEnvironmentProvider::seeded(seed),
        None => SyntheticEnvironmentProvider::from_entropy(),
    };
    RetryingProvider::new(synthetic, config.retry_policy())
}

pub(crate) fn scoring_engine(config: &ProviderConfig) -> ScoringEngine {
    match config.seed {
        Some(seed) => ScoringEngine::new(Arc::new(RandomConfidence::seeded(seed))),
        None => ScoringEngine::default(),
    }
}

pub(crate) fn build_lending_service(
    store: Arc<dyn KeyValueStore>,
    provider: &ProviderConfig,
) -> ApiLendingService {
    LendingService::new(
        Arc::new(StoreProfileRepository::new(store.clone())),
        Arc::new(StoreApplicationRepository::new(store)),
        Arc::new(environment_provider(provider)),
        scoring_engine(provider),
    )
}

pub(crate) fn parse_crop(raw: &str) -> Result<CropType, String> {
    const CROPS: [CropType; 7] = [
        CropType::Maize,
        CropType::Wheat,
        CropType::Tea,
        CropType::Coffee,
        CropType::Rice,
        CropType::Beans,
        CropType::Potatoes,
    ];

    let trimmed = raw.trim();
    CROPS
        .into_iter()
        .find(|crop| crop.label().eq_ignore_ascii_case(trimmed))
        .ok_or_else(|| {
            let known: Vec<&str> = CROPS.iter().map(|crop| crop.label()).collect();
            format!("unknown crop '{raw}' (expected one of {})", known.join(", "))
        })
}
