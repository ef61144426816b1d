//! Configuration model for the Yunmeng backend.

use serde::{Deserialize, Serialize};

use super::agent::Persona;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model provider configuration.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Text-to-speech configuration.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Simulation content: personas, places, meeting, triggers.
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Retry policy for provider calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            llm: LlmConfig::default(),
            tts: TtsConfig::default(),
            simulation: SimulationConfig::default(),
            retry: RetryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whether to enable CORS.
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// How long a request handler waits for a value that is still being
    /// produced before answering "pending", in milliseconds.
    #[serde(default = "default_wait_budget_ms")]
    pub wait_budget_ms: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_true() -> bool {
    true
}

const fn default_wait_budget_ms() -> u64 {
    2_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
            wait_budget_ms: default_wait_budget_ms(),
        }
    }
}

/// Language model provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub deepseek: DeepSeekConfig,
}

/// Gemini REST API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GeminiConfig {
    /// API key; falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_gemini_temperature")]
    pub temperature: f32,

    #[serde(default = "default_gemini_max_output_tokens")]
    pub max_output_tokens: u32,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

const fn default_gemini_timeout_secs() -> u64 {
    90
}

const fn default_gemini_temperature() -> f32 {
    0.8
}

const fn default_gemini_max_output_tokens() -> u32 {
    2_048
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            timeout_secs: default_gemini_timeout_secs(),
            temperature: default_gemini_temperature(),
            max_output_tokens: default_gemini_max_output_tokens(),
        }
    }
}

/// DeepSeek (OpenAI-compatible) API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DeepSeekConfig {
    /// API key; falls back to the `DEEPSEEK_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_deepseek_base_url")]
    pub base_url: String,

    #[serde(default = "default_deepseek_model")]
    pub model: String,

    #[serde(default = "default_deepseek_timeout_secs")]
    pub timeout_secs: u64,

    /// Poem generation runs cooler than scheduling.
    #[serde(default = "default_deepseek_temperature")]
    pub temperature: f32,

    #[serde(default = "default_deepseek_max_tokens")]
    pub max_tokens: u32,

    /// Theme handed to the poem prompt.
    #[serde(default = "default_poem_theme")]
    pub poem_theme: String,
}

fn default_deepseek_base_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_deepseek_model() -> String {
    "deepseek-chat".to_string()
}

const fn default_deepseek_timeout_secs() -> u64 {
    20
}

const fn default_deepseek_temperature() -> f32 {
    0.7
}

const fn default_deepseek_max_tokens() -> u32 {
    200
}

fn default_poem_theme() -> String {
    "一座寧靜的古代城市與其居民的日常生活".to_string()
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_deepseek_base_url(),
            model: default_deepseek_model(),
            timeout_secs: default_deepseek_timeout_secs(),
            temperature: default_deepseek_temperature(),
            max_tokens: default_deepseek_max_tokens(),
            poem_theme: default_poem_theme(),
        }
    }
}

/// ElevenLabs text-to-speech configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TtsConfig {
    /// Synthesis is skipped entirely when disabled.
    #[serde(default)]
    pub enabled: bool,

    /// API key; falls back to the `ELEVENLABS_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_tts_base_url")]
    pub base_url: String,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_tts_model")]
    pub model_id: String,

    /// Directory MP3 clips are written to.
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,

    #[serde(default = "default_tts_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_stability")]
    pub stability: f32,

    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
}

fn default_tts_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_voice_id() -> String {
    "crEjeSzlrwZRyvlQkB8c".to_string()
}

fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_audio_dir() -> String {
    "assets/audio".to_string()
}

const fn default_tts_timeout_secs() -> u64 {
    30
}

const fn default_stability() -> f32 {
    0.5
}

const fn default_similarity_boost() -> f32 {
    0.8
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            base_url: default_tts_base_url(),
            voice_id: default_voice_id(),
            model_id: default_tts_model(),
            audio_dir: default_audio_dir(),
            timeout_secs: default_tts_timeout_secs(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
        }
    }
}

/// The forced meeting: who must be where, and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MeetingPlan {
    /// Game-time label of the meeting slot.
    #[serde(default = "default_meeting_time")]
    pub time: String,

    #[serde(default = "default_meeting_location")]
    pub location: String,

    /// Persona ids expected to attend.
    #[serde(default = "default_meeting_agents")]
    pub agent_ids: Vec<String>,
}

fn default_meeting_time() -> String {
    "辰時三刻".to_string()
}

fn default_meeting_location() -> String {
    "酒館".to_string()
}

fn default_meeting_agents() -> Vec<String> {
    vec!["li_bai".to_string(), "li_qing_zhao".to_string()]
}

impl Default for MeetingPlan {
    fn default() -> Self {
        Self {
            time: default_meeting_time(),
            location: default_meeting_location(),
            agent_ids: default_meeting_agents(),
        }
    }
}

/// A per-agent special-event condition evaluated against schedule entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SpecialCondition {
    /// Display name of the agent the condition applies to.
    pub agent: String,
    pub condition: String,
}

/// Simulation content configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SimulationConfig {
    /// Places agents may be scheduled into.
    #[serde(default = "default_locations")]
    pub locations: Vec<String>,

    /// The townsfolk.
    #[serde(default = "default_personas")]
    pub personas: Vec<Persona>,

    #[serde(default)]
    pub meeting: MeetingPlan,

    #[serde(default = "default_special_conditions")]
    pub special_conditions: Vec<SpecialCondition>,

    /// Memory stream capacity per agent.
    #[serde(default = "default_max_memories")]
    pub max_memories: usize,

    /// How many recent memories reports and prompts include.
    #[serde(default = "default_recent_memories")]
    pub recent_memories: usize,

    /// Random encounter events scattered over a day.
    #[serde(default = "default_random_events")]
    pub random_events: usize,
}

fn default_locations() -> Vec<String> {
    ["河邊", "書院", "酒館", "衙門", "城門", "診所", "李清照家", "莊子家"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_personas() -> Vec<Persona> {
    vec![
        Persona {
            id: "li_bai".to_string(),
            name: "李白".to_string(),
            age: "45歲".to_string(),
            personality: "崇尚自由、自信驕傲、喜歡喝酒".to_string(),
            style: "隨意、喜歡即興創作與喝酒".to_string(),
            home: "目前被流放，晚上睡在河邊".to_string(),
            relations: "與莊子是好友，與李清照有些許曖昧關係".to_string(),
            initial_location: "河邊".to_string(),
        },
        Persona {
            id: "li_shengdun".to_string(),
            name: "李昇暾".to_string(),
            age: "51歲".to_string(),
            personality: "出口成章、對新科技非常了解".to_string(),
            style: "吟詩，作息規律、早睡早起、起床後會運動".to_string(),
            home: "書院".to_string(),
            relations: "莊子的同事，李清照的老師".to_string(),
            initial_location: "書院".to_string(),
        },
        Persona {
            id: "li_qing_zhao".to_string(),
            name: "李清照".to_string(),
            age: "19歲".to_string(),
            personality: "多愁善感、戀愛腦".to_string(),
            style: "寫詞，作息規律，家境富有，是一個名副其實的大家閨秀，在書院念書".to_string(),
            home: "李清照家".to_string(),
            relations: "李昇暾和莊子的學生".to_string(),
            initial_location: "李清照家".to_string(),
        },
        Persona {
            id: "zhuang_zi".to_string(),
            name: "莊子".to_string(),
            age: "55歲".to_string(),
            personality: "語言犀利、豁達灑脫、爽朗，人生閲歷豐富，對於人生乃至整個世界有獨屬自己的觀點"
                .to_string(),
            style: "開玩笑，容易失眠".to_string(),
            home: "莊子家".to_string(),
            relations: "李昇暾的同事，李清照的老師".to_string(),
            initial_location: "莊子家".to_string(),
        },
    ]
}

fn default_special_conditions() -> Vec<SpecialCondition> {
    [
        ("李白", "晚上李白準備睡覺時"),
        ("莊子", "莊子到河邊時"),
        ("李清照", "李清照在自家庭院中思考時"),
        ("李昇暾", "李昇暾作詩時"),
    ]
    .into_iter()
    .map(|(agent, condition)| SpecialCondition {
        agent: agent.to_string(),
        condition: condition.to_string(),
    })
    .collect()
}

const fn default_max_memories() -> usize {
    100
}

const fn default_recent_memories() -> usize {
    5
}

const fn default_random_events() -> usize {
    3
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            locations: default_locations(),
            personas: default_personas(),
            meeting: MeetingPlan::default(),
            special_conditions: default_special_conditions(),
            max_memories: default_max_memories(),
            recent_memories: default_recent_memories(),
            random_events: default_random_events(),
        }
    }
}

/// Retry policy configuration for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1_000
}

const fn default_max_backoff_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Look up a persona by id.
    pub fn persona(&self, id: &str) -> Option<&Persona> {
        self.simulation.personas.iter().find(|p| p.id == id)
    }
}
