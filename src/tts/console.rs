//! Silent engine that prints instead of speaking

use super::TtsEngine;
use anyhow::Result;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct ConsoleEngine;

#[async_trait]
impl TtsEngine for ConsoleEngine {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("🔊 {text}");
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
