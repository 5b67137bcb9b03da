//! Statistics collection and the per-death fitness log.

use crate::agent::Agent;
use crate::config::AgentConfig;
use crate::ecology::{ResourceKind, ResourcePools};
use crate::error::Result;
use crate::species::Species;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Per-species population figures
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SpeciesStats {
    pub alive: usize,
    pub fitness_mean: f32,
    pub fitness_best: f32,
    pub genes_mean: f32,
    pub hidden_mean: f32,
    pub deaths_total: u64,
}

/// Simulation statistics at a point in time
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Stats {
    pub time: u64,
    pub scaled_seconds: f64,
    pub species: BTreeMap<Species, SpeciesStats>,
    pub deaths_this_step: u64,
    pub deaths_total: u64,
    pub food_active: usize,
    pub water_active: usize,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a death for the step in progress
    pub fn record_death(&mut self, species: Species) {
        self.deaths_this_step += 1;
        self.deaths_total += 1;
        self.species.entry(species).or_default().deaths_total += 1;
    }

    /// Recompute population figures; resets the per-step death counter afterwards
    pub fn update(
        &mut self,
        time: u64,
        scaled_seconds: f64,
        agents: &[Agent],
        resources: &ResourcePools,
        config: &AgentConfig,
    ) {
        self.time = time;
        self.scaled_seconds = scaled_seconds;
        self.food_active = resources.active_count(ResourceKind::Food);
        self.water_active = resources.active_count(ResourceKind::Water);

        for entry in self.species.values_mut() {
            let deaths_total = entry.deaths_total;
            *entry = SpeciesStats {
                deaths_total,
                ..SpeciesStats::default()
            };
        }

        for agent in agents.iter().filter(|a| a.is_alive()) {
            let entry = self.species.entry(agent.species()).or_default();
            let fitness = agent.fitness(config);
            if entry.alive == 0 || fitness > entry.fitness_best {
                entry.fitness_best = fitness;
            }
            entry.alive += 1;
            entry.fitness_mean += fitness;
            entry.genes_mean += agent.genome().enabled_gene_count() as f32;
            entry.hidden_mean += agent.network().hidden_count() as f32;
        }

        for entry in self.species.values_mut().filter(|e| e.alive > 0) {
            let n = entry.alive as f32;
            entry.fitness_mean /= n;
            entry.genes_mean /= n;
            entry.hidden_mean /= n;
        }
    }

    /// Start counting a new step's deaths
    pub fn begin_step(&mut self) {
        self.deaths_this_step = 0;
    }

    pub fn population(&self) -> usize {
        self.species.values().map(|s| s.alive).sum()
    }

    /// Save stats to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        let species: Vec<String> = self
            .species
            .iter()
            .map(|(s, st)| {
                format!(
                    "{}:{:3} fit {:.3}/{:.3} genes {:.1} hid {:.1}",
                    s, st.alive, st.fitness_mean, st.fitness_best, st.genes_mean, st.hidden_mean
                )
            })
            .collect();
        format!(
            "T:{:7} | {:.0}s | Deaths:{:6} | Food:{:3} Water:{:3} | {}",
            self.time,
            self.scaled_seconds,
            self.deaths_total,
            self.food_active,
            self.water_active,
            species.join(" | ")
        )
    }
}

/// Periodic snapshots of [`Stats`]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    pub interval: u64,
    pub records: Vec<Stats>,
}

impl StatsHistory {
    pub fn new(interval: u64) -> Self {
        Self {
            interval,
            records: Vec::new(),
        }
    }

    pub fn record(&mut self, stats: Stats) {
        self.records.push(stats);
    }

    /// `(time, mean fitness)` series for one species
    pub fn fitness_series(&self, species: Species) -> Vec<(u64, f32)> {
        self.records
            .iter()
            .filter_map(|s| s.species.get(&species).map(|st| (s.time, st.fitness_mean)))
            .collect()
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// One death entry
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FitnessRecord {
    pub time: u64,
    pub species: Species,
    pub fitness: f32,
}

/// Number of recent deaths kept in memory
pub const FITNESS_WINDOW: usize = 1000;

/// Log of the fitness of every agent at death.
///
/// Only the most recent records stay in memory; the optional
/// `<dir>/<species>_fitness.csv` mirror holds the full history.
#[derive(Debug)]
pub struct FitnessLog {
    records: VecDeque<FitnessRecord>,
    capacity: usize,
    total: u64,
    dir: Option<PathBuf>,
    writers: HashMap<Species, BufWriter<File>>,
}

impl Default for FitnessLog {
    fn default() -> Self {
        Self::with_capacity(FITNESS_WINDOW)
    }
}

impl FitnessLog {
    /// In-memory log only
    pub fn new() -> Self {
        Self::default()
    }

    /// In-memory log keeping the last `capacity` records
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            total: 0,
            dir: None,
            writers: HashMap::new(),
        }
    }

    /// Log that also appends to CSV files under `dir`
    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        let mut log = Self::default();
        log.dir = Some(dir.as_ref().to_path_buf());
        Ok(log)
    }

    /// Record a death. The CSV line is on disk when this returns.
    pub fn record(&mut self, time: u64, species: Species, fitness: f32) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        if self.capacity > 0 {
            self.records.push_back(FitnessRecord { time, species, fitness });
        }
        self.total += 1;

        if self.dir.is_some() {
            if let Err(e) = self.write_line(time, species, fitness) {
                warn!("Failed to write {} fitness log: {}", species, e);
            }
        }
    }

    fn write_line(&mut self, time: u64, species: Species, fitness: f32) -> Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };
        if !self.writers.contains_key(&species) {
            let path = dir.join(format!("{}_fitness.csv", species.tag()));
            let is_new = !path.exists();
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let mut writer = BufWriter::new(file);
            if is_new {
                writeln!(writer, "time,fitness")?;
            }
            self.writers.insert(species, writer);
        }
        if let Some(writer) = self.writers.get_mut(&species) {
            writeln!(writer, "{},{}", time, fitness)?;
            writer.flush()?;
        }
        Ok(())
    }

    /// Flush any open CSV files
    pub fn flush(&mut self) {
        for (species, writer) in &mut self.writers {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush {} fitness log: {}", species, e);
            }
        }
    }

    /// Most recent records, oldest first
    pub fn records(&self) -> &VecDeque<FitnessRecord> {
        &self.records
    }

    /// Records currently held in memory
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Deaths recorded since the log was created
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Mean fitness of the most recent `window` deaths of `species`
    pub fn recent_mean(&self, species: Species, window: usize) -> Option<f32> {
        let recent: Vec<f32> = self
            .records
            .iter()
            .rev()
            .filter(|r| r.species == species)
            .take(window)
            .map(|r| r.fitness)
            .collect();
        if recent.is_empty() {
            None
        } else {
            Some(recent.iter().sum::<f32>() / recent.len() as f32)
        }
    }
}

impl Drop for FitnessLog {
    fn drop(&mut self) {
        self.flush();
    }
}
