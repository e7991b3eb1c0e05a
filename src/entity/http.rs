//! HTTP entity source.
//!
//! Each line is POSTed as `{"text": "..."}` to a tagging endpoint, which
//! answers with a JSON span array
//! (`[{"label":"PER","offset":0,"length":12}]`).

use std::time::Duration;

use serde::Serialize;

use super::{EntitySource, EntitySpan};
use crate::error::PagetagError;

#[derive(Serialize)]
struct TagRequest<'a> {
    text: &'a str,
}

/// Entity source backed by a JSON-over-HTTP tagging service.
pub struct HttpTagger {
    url: String,
    agent: ureq::Agent,
}

impl HttpTagger {
    pub fn new(url: impl Into<String>) -> Result<Self, PagetagError> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PagetagError::TaggerUnavailable {
                message: format!("tagger URL must be http(s): {url}"),
            });
        }

        let config = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(60)))
            .build();
        let agent: ureq::Agent = config.into();

        Ok(Self { url, agent })
    }
}

impl EntitySource for HttpTagger {
    fn tag_line(&mut self, text: &str) -> Result<Vec<EntitySpan>, PagetagError> {
        let mut response = self
            .agent
            .post(self.url.as_str())
            .send_json(&TagRequest { text })
            .map_err(|source| PagetagError::TaggerFailed {
                message: format!("{}: {source}", self.url),
            })?;

        response
            .body_mut()
            .read_json::<Vec<EntitySpan>>()
            .map_err(|source| PagetagError::TaggerFailed {
                message: format!("{}: unexpected reply: {source}", self.url),
            })
    }
}
