//! Genome bank: saving and loading the genomes of a population.

use crate::error::{Error, Result};
use crate::neural::{Gene, Genome};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"ECOG";

/// Persisted form of one genome
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenomeRecord {
    pub id: u32,
    pub uses_structural_mutation: bool,
    pub is_prey: bool,
    pub size_trait: f32,
    pub genes: Vec<Gene>,
}

impl GenomeRecord {
    pub fn max_innovation(&self) -> Option<u32> {
        self.genes.iter().map(|g| g.innovation()).max()
    }
}

/// Every genome of a population, one per agent slot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenomeBank {
    /// Version for compatibility checking
    pub version: u32,
    /// Simulation step the bank was taken at
    pub time: u64,
    pub genomes: Vec<GenomeRecord>,
}

impl GenomeBank {
    /// Current bank version
    pub const VERSION: u32 = 1;

    pub fn new(time: u64, genomes: Vec<GenomeRecord>) -> Self {
        Self {
            version: Self::VERSION,
            time,
            genomes,
        }
    }

    pub fn from_genomes<'a, I>(time: u64, genomes: I) -> Self
    where
        I: IntoIterator<Item = &'a Genome>,
    {
        Self::new(time, genomes.into_iter().map(Genome::to_record).collect())
    }

    /// Save bank to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(MAGIC)?;
        let encoded = bincode::serialize(self)?;
        writer.write_all(&encoded)?;
        writer.flush()?;
        Ok(())
    }

    /// Load bank from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        let bank: GenomeBank = bincode::deserialize(&buffer)?;
        bank.check_version()?;
        Ok(bank)
    }

    /// Save bank as pretty-printed JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let bank: GenomeBank = serde_json::from_str(&contents)?;
        bank.check_version()?;
        Ok(bank)
    }

    /// Load either format, picking JSON by file extension
    pub fn load_any<P: AsRef<Path>>(path: P) -> Result<Self> {
        let is_json = path.as_ref().extension().map_or(false, |ext| ext == "json");
        if is_json {
            Self::load_json(path)
        } else {
            Self::load(path)
        }
    }

    fn check_version(&self) -> Result<()> {
        if self.version != Self::VERSION {
            return Err(Error::VersionMismatch {
                expected: Self::VERSION,
                found: self.version,
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Largest innovation number across all genomes
    pub fn max_innovation(&self) -> Option<u32> {
        self.genomes.iter().filter_map(GenomeRecord::max_innovation).max()
    }

    /// Largest genome id in the bank
    pub fn max_id(&self) -> Option<u32> {
        self.genomes.iter().map(|g| g.id).max()
    }
}
