//! Talking to the analysis service: the HTTP client, its errors, and the
//! background status poll loop.

mod client;
mod error;
mod poller;
#[cfg(test)]
pub(crate) mod testing;

pub use client::{AnalysisApi, AnalysisClient};
pub use error::ApiError;
pub(crate) use poller::{PollParams, PollTask};

use crate::model::{JobStatusResponse, SubmitResponse};

/// Result of one request, tagged with the submission generation it was made for.
#[derive(Debug)]
pub enum Outcome {
    Submitted {
        generation: u64,
        result: Result<SubmitResponse, ApiError>,
    },
    Polled {
        generation: u64,
        job_id: String,
        result: Result<JobStatusResponse, ApiError>,
    },
}

impl Outcome {
    pub fn generation(&self) -> u64 {
        match self {
            Outcome::Submitted { generation, .. } | Outcome::Polled { generation, .. } => {
                *generation
            }
        }
    }
}
