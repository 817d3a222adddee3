//! Summary statistics and CSV output of a finished run.

use std::fmt;
use std::fs::File;
use std::path::Path;

use eyre::WrapErr;
use itertools::Itertools;
use serde::Serialize;

use crate::{BusId, Metrics, RouteName, StopName};

/// Waiting time statistics over all boarded passengers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitingStats {
    /// Average waiting time.
    pub mean: f64,
    /// Median waiting time.
    pub median: f64,
    /// Longest waiting time.
    pub max: f64,
}

impl WaitingStats {
    /// Computes the statistics, or returns `None` if nobody waited.
    #[must_use]
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let sorted: Vec<f64> = samples.iter().copied().sorted_by(f64::total_cmp).collect();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        Some(Self {
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            median,
            max: sorted[sorted.len() - 1],
        })
    }
}

/// Usage summary of a single bus.
#[derive(Debug, Clone, PartialEq)]
pub struct BusSummary {
    /// Bus ID.
    pub bus: BusId,
    /// Route of the bus.
    pub route: RouteName,
    /// Total travel time.
    pub active_time: f64,
    /// Passenger load times travel time.
    pub occupied_time: f64,
    /// Completed cycles over the route.
    pub trips_completed: usize,
    /// Average number of passengers onboard while travelling.
    pub average_occupancy: f64,
    /// Average occupancy as a percentage of the capacity.
    pub utilization: f64,
}

/// Summary of a run, printable as plain text tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Number of boarded passengers.
    pub served: usize,
    /// Waiting time statistics, if anybody boarded.
    pub waiting: Option<WaitingStats>,
    /// Number of boardings per stop.
    pub served_per_stop: Vec<(StopName, usize)>,
    /// Per-bus usage.
    pub buses: Vec<BusSummary>,
}

impl Summary {
    /// Summarizes metrics collected with buses of the given capacity.
    #[must_use]
    pub fn from_metrics(metrics: &Metrics, capacity: usize) -> Self {
        Self {
            served: metrics.total_served(),
            waiting: WaitingStats::from_samples(metrics.waiting_times()),
            served_per_stop: metrics
                .served_per_stop()
                .iter()
                .map(|(stop, &count)| (stop.clone(), count))
                .collect(),
            buses: metrics
                .buses()
                .iter()
                .map(|(bus, usage)| BusSummary {
                    bus: bus.clone(),
                    route: usage.route.clone(),
                    active_time: usage.active_time,
                    occupied_time: usage.occupied_time,
                    trips_completed: usage.trips_completed,
                    average_occupancy: usage.average_occupancy(),
                    utilization: usage.utilization(capacity),
                })
                .collect(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total passengers served: {}", self.served)?;
        match &self.waiting {
            Some(waiting) => {
                writeln!(f, "Average wait time: {:.2}", waiting.mean)?;
                writeln!(f, "Median wait time: {:.2}", waiting.median)?;
                writeln!(f, "Max wait time: {:.2}", waiting.max)?;
            }
            None => writeln!(f, "No passenger has boarded")?,
        }
        writeln!(f)?;
        writeln!(f, "{:<8} {:>8}", "Stop", "Served")?;
        for (stop, count) in &self.served_per_stop {
            writeln!(f, "{:<8} {:>8}", stop.as_str(), count)?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:<10} {:<6} {:>10} {:>10} {:>6} {:>8} {:>8}",
            "Bus", "Route", "Active", "Occupied", "Trips", "AvgOcc", "Util%"
        )?;
        for bus in &self.buses {
            writeln!(
                f,
                "{:<10} {:<6} {:>10.1} {:>10.1} {:>6} {:>8.2} {:>8.1}",
                bus.bus.as_str(),
                bus.route.as_str(),
                bus.active_time,
                bus.occupied_time,
                bus.trips_completed,
                bus.average_occupancy,
                bus.utilization
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct BusRow<'a> {
    bus: &'a BusId,
    route: &'a RouteName,
    active_time: f64,
    occupied_time: f64,
    trips_completed: usize,
}

fn csv_writer(dir: &Path, name: &str) -> eyre::Result<csv::Writer<File>> {
    let path = dir.join(name);
    csv::Writer::from_path(&path)
        .wrap_err_with(|| format!("unable to create {}", path.display()))
}

/// Writes `passengers.csv`, `buses.csv`, and `queues.csv` to the directory `dir`,
/// which must exist.
///
/// # Errors
///
/// Returns an error if any file cannot be written.
pub fn write_csv<P: AsRef<Path>>(metrics: &Metrics, dir: P) -> eyre::Result<()> {
    let dir = dir.as_ref();

    let mut writer = csv_writer(dir, "passengers.csv")?;
    for record in metrics.passengers() {
        writer.serialize(record)?;
    }
    writer.flush()?;

    let mut writer = csv_writer(dir, "buses.csv")?;
    for (bus, usage) in metrics.buses() {
        writer.serialize(BusRow {
            bus,
            route: &usage.route,
            active_time: usage.active_time,
            occupied_time: usage.occupied_time,
            trips_completed: usage.trips_completed,
        })?;
    }
    writer.flush()?;

    let mut writer = csv_writer(dir, "queues.csv")?;
    for sample in metrics.queue_samples() {
        writer.serialize(sample)?;
    }
    writer.flush()?;

    log::info!("Results written to {}", dir.display());
    Ok(())
}
