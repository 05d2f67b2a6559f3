use std::path::PathBuf;

use log::{info, warn};
use reqwest::Client;

use crate::models::timetable_model::TimetableDocument;
use crate::timetable::get_timetable_document;

/// A trait, necessary for every entity that will be used for getting the
/// timetable dataset.
#[allow(async_fn_in_trait)]
pub trait TimetableGetter {
    async fn get_timetable(&self) -> Option<TimetableDocument>;
}

/// Reads the dataset from a local JSON file.
pub struct LocalTimetable {
    pub path: PathBuf,
}

impl TimetableGetter for LocalTimetable {
    async fn get_timetable(&self) -> Option<TimetableDocument> {
        get_timetable_document(&self.path)
    }
}

/// Fetches the dataset from a remotely served JSON document.
pub struct RemoteTimetable {
    pub client: Client,
    pub url: String,
}

impl TimetableGetter for RemoteTimetable {
    async fn get_timetable(&self) -> Option<TimetableDocument> {
        info!("Getting timetable dataset from {}", self.url);
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not fetch timetable dataset: {}", e);
                return None;
            }
        };
        match response.json().await {
            Ok(document) => Some(document),
            Err(e) => {
                warn!("Malformed remote timetable dataset: {}", e);
                None
            }
        }
    }
}
