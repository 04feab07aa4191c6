//! Browser navigation

use anyhow::Result;
use std::process::{Child, Command};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens URLs for the user
pub trait Browser: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// Hands URLs to the desktop's default browser
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> Result<()> {
        debug!("Opening {}", url);

        let opener = if cfg!(target_os = "macos") {
            "open"
        } else {
            "xdg-open"
        };
        let child = Command::new(opener).arg(url).spawn()?;
        reap(child);
        Ok(())
    }
}

/// Wait on the opener in the background so it never lingers as a zombie
fn reap(mut child: Child) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => warn!("Browser opener exited with {}", status),
        Ok(_) => {}
        Err(e) => warn!("Could not wait on browser opener: {}", e),
    })
}

/// Builds navigation URLs and the confirmation text for them
#[derive(Clone)]
pub struct BrowserService {
    browser: Arc<dyn Browser>,
}

impl BrowserService {
    pub fn new(browser: Arc<dyn Browser>) -> Self {
        Self { browser }
    }

    /// Open a URL whose scheme is already normalized
    pub fn open_url(&self, url: &str) -> String {
        match self.browser.open(url) {
            Ok(()) => {
                info!("🌐 Opened {}", url);
                format!("EndyOS abriendo {url}")
            }
            Err(e) => {
                warn!("❌ Could not open {}: {}", url, e);
                format!("EndyOS no pudo abrir {url}. Verifica la dirección.")
            }
        }
    }

    /// Run a web search
    pub fn search(&self, query: &str) -> String {
        let url = format!(
            "https://www.google.com/search?q={}",
            urlencoding::encode(query)
        );
        match self.browser.open(&url) {
            Ok(()) => format!("EndyOS buscando \"{query}\" en Google"),
            Err(e) => {
                warn!("❌ Web search failed: {}", e);
                "EndyOS no pudo realizar la búsqueda en Google".to_string()
            }
        }
    }

    /// Open a URL without producing a confirmation
    pub fn open_silently(&self, url: &str) -> Result<()> {
        self.browser.open(url)
    }
}
