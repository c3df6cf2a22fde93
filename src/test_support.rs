//! In-memory fetcher for pipeline tests.

use crate::scraper::{Fetch, ScraperError};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

struct Route {
    reply: Reply,
    delay: Duration,
}

/// Serves canned bodies or status codes per URL. Unknown URLs answer 404.
/// Records the order in which requests complete.
#[derive(Default)]
pub struct FakeFetcher {
    routes: HashMap<String, Route>,
    completed: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(mut self, url: &str, body: Vec<u8>) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                reply: Reply::Body(body),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_bytes(url, html.as_bytes().to_vec())
    }

    pub fn with_delayed_page(mut self, url: &str, html: &str, delay: Duration) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                reply: Reply::Body(html.as_bytes().to_vec()),
                delay,
            },
        );
        self
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            Route {
                reply: Reply::Status(status),
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }
}

impl Fetch for FakeFetcher {
    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ScraperError> {
        let result = match self.routes.get(url) {
            Some(route) => {
                std::thread::sleep(route.delay);
                match &route.reply {
                    Reply::Body(body) => Ok(body.clone()),
                    Reply::Status(status) => Err(ScraperError::HttpStatus {
                        status: *status,
                        url: url.to_string(),
                    }),
                }
            }
            None => Err(ScraperError::HttpStatus {
                status: 404,
                url: url.to_string(),
            }),
        };
        if let Ok(mut completed) = self.completed.lock() {
            completed.push(url.to_string());
        }
        result
    }
}
