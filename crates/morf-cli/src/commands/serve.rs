use crate::config::MorfConfig;
use morf_server::LearningServer;
use std::path::PathBuf;

pub fn execute(config: &MorfConfig, cpu: bool, weights: Option<PathBuf>) -> anyhow::Result<()> {
    let learner = super::load_learner(config, cpu, weights)?;
    let address = config.server.address();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let server = LearningServer::bind(address.as_str(), learner).await?;
        println!("listening on {}", server.local_addr()?);
        server.run().await
    })?;
    Ok(())
}
