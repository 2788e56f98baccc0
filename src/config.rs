use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub llm_provider: String,
    pub fpt_api_key: String,
    pub fpt_api_url: String,
    pub fpt_model: String,
    pub ollama_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "sportbook.db".to_string()),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".to_string()),
            fpt_api_key: env::var("FPT_API_KEY").unwrap_or_default(),
            fpt_api_url: env::var("FPT_API_URL")
                .unwrap_or_else(|_| "https://mkp-api.fptcloud.com/v1".to_string()),
            fpt_model: env::var("FPT_MODEL").unwrap_or_else(|_| "Llama-3.3-70B-Instruct".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
        }
    }
}
