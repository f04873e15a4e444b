//! Summary statistics for training reports.
//!
//! - [`descriptive`]: min, max, mean, median and spread of a dataset
//!
//! # Example
//!
//! ```
//! use neurosnake_stats::descriptive::DescriptiveStats;
//!
//! let fitness = [120.0, 80.0, 100.0];
//! let stats = DescriptiveStats::new(fitness).unwrap();
//! assert_eq!(stats.mean, 100.0);
//! assert_eq!(stats.median, 100.0);
//! ```

pub mod descriptive;
