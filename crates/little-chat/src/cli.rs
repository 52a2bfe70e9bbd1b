use clap::{Parser, Subcommand};
use little_chat_gemini_model::{GeminiConfigBuilder, GeminiProvider};

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// API key used to authenticate with the Gemini API.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Name of the model to talk to.
    ///
    /// Defaults to `gemini-2.0-flash`.
    #[arg(long, env = "GEMINI_MODEL")]
    pub model: Option<String>,

    /// Base URL of the API, up to and including the version segment.
    #[arg(long, env = "GEMINI_BASE_URL")]
    pub base_url: Option<String>,

    /// Sampling temperature passed to the model.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum number of tokens in each response.
    #[arg(long)]
    pub max_output_tokens: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Chat with the model, one message at a time
    Chat,

    /// Summarize a piece of text
    Summarize {
        /// Print the summary as it's being generated
        #[arg(long, default_value_t = false)]
        stream: bool,

        /// Text to summarize. Read from stdin if omitted.
        text: Option<String>,
    },
}

impl Cli {
    pub fn model_provider(&self) -> GeminiProvider {
        let mut builder = GeminiConfigBuilder::with_api_key(&self.api_key);
        if let Some(model) = &self.model {
            builder = builder.with_model(model);
        }
        if let Some(base_url) = &self.base_url {
            builder = builder.with_base_url(base_url);
        }
        if let Some(temperature) = self.temperature {
            builder = builder.with_temperature(temperature);
        }
        if let Some(max_output_tokens) = self.max_output_tokens {
            builder = builder.with_max_output_tokens(max_output_tokens);
        }
        GeminiProvider::new(builder.build())
    }
}
