use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_raw_csv")]
    pub raw_csv: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_sample_rows")]
    pub validation_sample_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityConfig {
    /// Promote orphaned fact rows from a warning to a hard failure.
    #[serde(default)]
    pub fail_on_orphans: bool,
    /// Promote staging rows dropped by the fact join to a hard failure.
    #[serde(default)]
    pub fail_on_unmatched: bool,
    #[serde(default = "default_max_reported")]
    pub max_reported_unmatched: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub integrity: IntegrityConfig,
}

fn default_db_path() -> String {
    "data/warehouse.db".into()
}
fn default_raw_csv() -> String {
    "data/raw/paysim1.csv".into()
}
fn default_delimiter() -> String {
    ",".into()
}
fn default_chunk_size() -> usize {
    crate::staging::DEFAULT_CHUNK_SIZE
}
fn default_sample_rows() -> usize {
    1000
}
fn default_max_reported() -> usize {
    20
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            raw_csv: default_raw_csv(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            validation_sample_rows: default_sample_rows(),
        }
    }
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            fail_on_orphans: false,
            fail_on_unmatched: false,
            max_reported_unmatched: default_max_reported(),
        }
    }
}

impl WarehouseConfig {
    /// Load from a JSON config file. Absent fields take their defaults.
    /// In tests, use WarehouseConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: WarehouseConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ingestion.chunk_size == 0 {
            anyhow::bail!("ingestion.chunk_size must be > 0");
        }
        if self.ingestion.validation_sample_rows == 0 {
            anyhow::bail!("ingestion.validation_sample_rows must be > 0");
        }
        if self.data.delimiter.len() != 1 {
            anyhow::bail!(
                "data.delimiter must be a single byte, got '{}'",
                self.data.delimiter
            );
        }
        Ok(())
    }

    /// The source delimiter as a byte. `validate()` guarantees one byte.
    pub fn delimiter(&self) -> u8 {
        self.data.delimiter.as_bytes().first().copied().unwrap_or(b',')
    }

    /// Small chunks and strict integrity, so tests exercise multi-chunk
    /// loads and surface every dropped row.
    pub fn default_test() -> Self {
        Self {
            database: DatabaseConfig {
                path: ":memory:".into(),
            },
            data: DataConfig::default(),
            ingestion: IngestionConfig {
                chunk_size: 2,
                validation_sample_rows: 1000,
            },
            integrity: IntegrityConfig {
                fail_on_orphans: true,
                fail_on_unmatched: false,
                max_reported_unmatched: 20,
            },
        }
    }
}
