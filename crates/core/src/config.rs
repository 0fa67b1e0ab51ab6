//! 설정 관리: acuctl.toml 파싱 및 런타임 설정
//!
//! [`AcuctlConfig`]는 API 연결 정보와 auto 워크플로우 기본값을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`ACUCTL_API_URL=https://scanner:3443/api/v1` 형식)
//! 3. 설정 파일 (`acuctl.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), acuctl_core::error::AcuctlError> {
//! use acuctl_core::config::AcuctlConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = AcuctlConfig::load("acuctl.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = AcuctlConfig::parse("[api]\nurl = \"https://scanner:3443/api/v1\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AcuctlError, ConfigError};
use crate::types::{DEFAULT_EXPORT_TYPE_ID, DEFAULT_REPORT_TEMPLATE_ID, DEFAULT_SCAN_PROFILE_ID};

/// `auto.wait_timeout_secs`의 상한 (7일)
pub const MAX_WAIT_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// acuctl 통합 설정
///
/// `acuctl.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcuctlConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캐너 API 연결 설정
    #[serde(default)]
    pub api: ApiConfig,
    /// auto 워크플로우 설정
    #[serde(default)]
    pub auto: AutoConfig,
}

impl AcuctlConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 유효성 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, AcuctlError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작하는 [`load`](Self::load) 변형입니다.
    ///
    /// 기본 경로의 설정 파일은 선택 사항이므로 CLI는 명시적으로 경로를
    /// 지정하지 않은 경우 이 함수를 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, AcuctlError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(AcuctlError::Config(ConfigError::FileNotFound { .. })) => {
                debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, AcuctlError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AcuctlError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                AcuctlError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, AcuctlError> {
        toml::from_str(toml_str).map_err(|e| {
            AcuctlError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `ACUCTL_{SECTION}_{FIELD}`
    /// 예: `ACUCTL_API_API_KEY=1986ad8c0a5b3df4d7028d5f3c06e936c`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "ACUCTL_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "ACUCTL_GENERAL_LOG_FORMAT");

        // API
        override_string(&mut self.api.url, "ACUCTL_API_URL");
        override_string(&mut self.api.api_key, "ACUCTL_API_API_KEY");
        override_u64(
            &mut self.api.request_timeout_secs,
            "ACUCTL_API_REQUEST_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.api.accept_invalid_certs,
            "ACUCTL_API_ACCEPT_INVALID_CERTS",
        );

        // Auto
        override_string(
            &mut self.auto.scan_profile_id,
            "ACUCTL_AUTO_SCAN_PROFILE_ID",
        );
        override_string(
            &mut self.auto.report_template_id,
            "ACUCTL_AUTO_REPORT_TEMPLATE_ID",
        );
        override_string(&mut self.auto.export_type_id, "ACUCTL_AUTO_EXPORT_TYPE_ID");
        override_u64(
            &mut self.auto.wait_timeout_secs,
            "ACUCTL_AUTO_WAIT_TIMEOUT_SECS",
        );
        override_u64(
            &mut self.auto.scan_poll_interval_secs,
            "ACUCTL_AUTO_SCAN_POLL_INTERVAL_SECS",
        );
        override_u64(
            &mut self.auto.report_poll_interval_secs,
            "ACUCTL_AUTO_REPORT_POLL_INTERVAL_SECS",
        );
        override_u32(
            &mut self.auto.target_criticality,
            "ACUCTL_AUTO_TARGET_CRITICALITY",
        );
        override_string(
            &mut self.auto.report_description,
            "ACUCTL_AUTO_REPORT_DESCRIPTION",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AcuctlError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        // api.url 검증
        match url::Url::parse(&self.api.url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(ConfigError::InvalidValue {
                    field: "api.url".to_owned(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                }
                .into());
            }
            Err(e) => {
                return Err(ConfigError::InvalidValue {
                    field: "api.url".to_owned(),
                    reason: e.to_string(),
                }
                .into());
            }
        }

        let positive = [
            ("api.request_timeout_secs", self.api.request_timeout_secs),
            ("auto.wait_timeout_secs", self.auto.wait_timeout_secs),
            (
                "auto.scan_poll_interval_secs",
                self.auto.scan_poll_interval_secs,
            ),
            (
                "auto.report_poll_interval_secs",
                self.auto.report_poll_interval_secs,
            ),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must be greater than 0".to_owned(),
                }
                .into());
            }
        }

        if self.auto.wait_timeout_secs > MAX_WAIT_TIMEOUT_SECS {
            return Err(ConfigError::InvalidValue {
                field: "auto.wait_timeout_secs".to_owned(),
                reason: format!("must be at most {MAX_WAIT_TIMEOUT_SECS}"),
            }
            .into());
        }

        // auto 기본 ID는 비어 있으면 안 됨
        let ids = [
            ("auto.scan_profile_id", &self.auto.scan_profile_id),
            ("auto.report_template_id", &self.auto.report_template_id),
            ("auto.export_type_id", &self.auto.export_type_id),
        ];
        for (field, value) in ids {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스캐너 API 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 기본 URL (예: `https://localhost:3443/api/v1`)
    pub url: String,
    /// `X-Auth` 헤더로 전송되는 API 키
    pub api_key: String,
    /// 요청 단위 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 자체 서명 인증서 허용 여부
    pub accept_invalid_certs: bool,
}

impl ApiConfig {
    /// 요청 타임아웃을 `Duration`으로 반환합니다.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: "https://localhost:3443/api/v1".to_owned(),
            api_key: String::new(),
            request_timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

/// auto 워크플로우 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoConfig {
    /// 스캔 프로필 ID를 지정하지 않았을 때 사용할 기본값
    pub scan_profile_id: String,
    /// HTML 리포트 템플릿 ID 기본값
    pub report_template_id: String,
    /// CSV 내보내기에 사용할 export 타입 ID
    pub export_type_id: String,
    /// 각 대기 단계의 타임아웃 (초)
    pub wait_timeout_secs: u64,
    /// 스캔 상태 폴링 간격 (초)
    pub scan_poll_interval_secs: u64,
    /// 리포트/export 상태 폴링 간격 (초)
    pub report_poll_interval_secs: u64,
    /// 생성되는 타겟의 중요도
    pub target_criticality: u32,
    /// 생성되는 리포트 설명
    pub report_description: String,
}

impl AutoConfig {
    /// 대기 타임아웃
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    /// 스캔 폴링 간격
    pub fn scan_poll_interval(&self) -> Duration {
        Duration::from_secs(self.scan_poll_interval_secs)
    }

    /// 리포트/export 폴링 간격
    pub fn report_poll_interval(&self) -> Duration {
        Duration::from_secs(self.report_poll_interval_secs)
    }
}

impl Default for AutoConfig {
    fn default() -> Self {
        Self {
            scan_profile_id: DEFAULT_SCAN_PROFILE_ID.to_owned(),
            report_template_id: DEFAULT_REPORT_TEMPLATE_ID.to_owned(),
            export_type_id: DEFAULT_EXPORT_TYPE_ID.to_owned(),
            wait_timeout_secs: 800,
            scan_poll_interval_secs: 10,
            report_poll_interval_secs: 5,
            target_criticality: 30,
            report_description: "Auto-generated report".to_owned(),
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
