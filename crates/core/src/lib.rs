//! acuctl 공통 크레이트
//!
//! 설정([`AcuctlConfig`]), 최상위 에러([`AcuctlError`]), 스캐너 API 도메인 타입,
//! 메트릭 이름을 정의합니다. `acuctl-auto`와 `acuctl-cli`가 공유합니다.

pub mod config;
pub mod error;
pub mod metrics;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{AcuctlError, ConfigError};

// 설정
pub use config::{AcuctlConfig, ApiConfig, AutoConfig, GeneralConfig};

// 도메인 타입
pub use types::{
    AddTargetsRequest, CreateRequest, NewExport, NewReport, NewScan, NewTarget, ReportFormat,
    ResourceKind, ResourceStatus,
};
