use std::env;

pub struct Config {
    pub gateway: GatewayConfig,
    pub judge: JudgeConfig,
}

pub struct GatewayConfig {
    /// WebSocket URL of the realtime sync gateway
    pub url: String,
}

pub struct JudgeConfig {
    /// Base HTTP URL of the judge execution service
    pub url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        Self {
            gateway: GatewayConfig {
                url: env::var("GATEWAY_URL")
                    .unwrap_or_else(|_| "ws://127.0.0.1:4000/ws".to_string()),
            },
            judge: JudgeConfig {
                url: env::var("JUDGE_API_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:4000".to_string()),
                timeout_secs: env::var("JUDGE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "20".to_string())
                    .parse()
                    .unwrap_or(20),
            },
        }
    }
}

impl JudgeConfig {
    /// URL of the compile/run endpoint
    pub fn compile_url(&self) -> String {
        format!("{}/api/compile", self.url.trim_end_matches('/'))
    }

    /// URL of the health check endpoint
    pub fn health_url(&self) -> String {
        format!("{}/health", self.url.trim_end_matches('/'))
    }
}
