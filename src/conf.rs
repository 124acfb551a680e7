use anyhow::Result;
use serde::Deserialize;
use tracing::info;

#[derive(Deserialize, Default)]
pub struct Conf {
    #[serde(default)]
    pub probe: Probe,
    #[serde(default)]
    pub hosts: Vec<Host>,
}

#[derive(Deserialize, Default)]
pub struct Probe {
    pub timeout_ms: Option<u64>,
    pub interval_ms: Option<u64>,
    pub count: Option<u32>,
    pub tcp_port: Option<u16>,
}

#[derive(Deserialize)]
pub struct Host {
    pub address: String,
}

pub async fn read_conf(path: &str) -> Result<Conf> {
    use tokio::fs;

    info!("read conf from {}", path);
    let conf = fs::read_to_string(path).await?;
    let conf = toml::from_str::<Conf>(&conf)?;

    Ok(conf)
}
