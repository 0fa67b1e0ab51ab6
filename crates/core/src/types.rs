//! 도메인 타입: 스캐너 API 리소스와 요청 페이로드
//!
//! 원격 리소스(타겟, 스캔, 리포트, export)는 서비스가 발급한 불투명한 문자열 ID로
//! 식별됩니다. 이 모듈은 해당 리소스를 생성하기 위한 요청 본문과
//! 상태 조회 결과를 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 스캔 프로필 ID 기본값 ("Full Scan")
pub const DEFAULT_SCAN_PROFILE_ID: &str = "11111111-1111-1111-1111-111111111111";

/// 리포트 템플릿 ID 기본값 ("Developer")
pub const DEFAULT_REPORT_TEMPLATE_ID: &str = "11111111-1111-1111-1111-111111111126";

/// CSV export 타입 ID
pub const DEFAULT_EXPORT_TYPE_ID: &str = "21111111-1111-1111-1111-111111111141";

/// 원격 리소스 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    /// 스캔 대상
    Target,
    /// 스캔
    Scan,
    /// HTML 리포트
    Report,
    /// CSV export
    Export,
}

impl ResourceKind {
    /// REST 컬렉션 경로 (`/targets`, `/scans`, ...)
    pub fn collection_path(&self) -> &'static str {
        match self {
            Self::Target => "/targets",
            Self::Scan => "/scans",
            Self::Report => "/reports",
            Self::Export => "/exports",
        }
    }

    /// 메트릭 레이블 및 로그 필드용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Target => "target",
            Self::Scan => "scan",
            Self::Report => "report",
            Self::Export => "export",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// auto 워크플로우가 생성하는 결과물 형식
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// 리포트 템플릿으로 생성한 HTML 리포트
    #[default]
    Html,
    /// scans export로 생성한 CSV
    Csv,
}

impl ReportFormat {
    /// 다운로드 링크 필터링에 쓰이는 파일 확장자 (점 제외)
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Csv => "csv",
        }
    }

    /// 이 형식을 담당하는 원격 리소스 종류
    pub fn artifact_kind(&self) -> ResourceKind {
        match self {
            Self::Html => ResourceKind::Report,
            Self::Csv => ResourceKind::Export,
        }
    }

    /// 링크가 이 형식의 확장자로 끝나는지 확인합니다 (대소문자 무시).
    pub fn matches_link(&self, link: &str) -> bool {
        let path = link.split(['?', '#']).next().unwrap_or(link);
        path.to_ascii_lowercase()
            .ends_with(&format!(".{}", self.extension()))
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown format '{other}' (expected: html, csv)")),
        }
    }
}

// --- 요청 페이로드 ---

/// 새 타겟 정의
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTarget {
    /// 스캔할 URL
    pub address: String,
    /// 설명
    pub description: String,
    /// 타겟 유형 (`default`)
    #[serde(rename = "type")]
    pub target_type: String,
    /// 중요도 가중치
    pub criticality: u32,
}

impl NewTarget {
    /// 기본 유형과 빈 설명으로 타겟을 만듭니다.
    pub fn new(address: impl Into<String>, criticality: u32) -> Self {
        Self {
            address: address.into(),
            description: String::new(),
            target_type: "default".to_owned(),
            criticality,
        }
    }
}

/// `POST /targets/add` 요청 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTargetsRequest {
    /// 추가할 타겟 목록
    pub targets: Vec<NewTarget>,
    /// 타겟을 넣을 그룹 ID 목록
    pub groups: Vec<String>,
}

impl AddTargetsRequest {
    /// 그룹 없이 타겟 하나를 추가하는 요청
    pub fn single(target: NewTarget) -> Self {
        Self {
            targets: vec![target],
            groups: Vec::new(),
        }
    }
}

/// 스캔 스케줄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSchedule {
    /// 스케줄 비활성화 (즉시 실행)
    pub disable: bool,
    /// 시간 민감 여부
    pub time_sensitive: bool,
    /// 시작 일시 (즉시 실행이면 `null`)
    pub start_date: Option<String>,
}

impl ScanSchedule {
    /// 즉시 실행 스케줄
    pub fn immediate() -> Self {
        Self {
            disable: true,
            time_sensitive: false,
            start_date: None,
        }
    }
}

/// `POST /scans` 요청 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewScan {
    /// 대상 타겟 ID
    pub target_id: String,
    /// 스캔 프로필 ID
    pub profile_id: String,
    /// 스케줄
    pub schedule: ScanSchedule,
    /// 증분 스캔 여부
    pub incremental: bool,
}

impl NewScan {
    /// 즉시 실행되는 전체(비증분) 스캔
    pub fn immediate(target_id: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            profile_id: profile_id.into(),
            schedule: ScanSchedule::immediate(),
            incremental: false,
        }
    }
}

/// 리포트 소스
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSource {
    /// 설명
    pub description: String,
    /// 소스 목록 유형 (`scan_result`, `scans`, ...)
    pub list_type: String,
    /// 소스 ID 목록
    pub id_list: Vec<String>,
}

/// `POST /reports` 요청 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewReport {
    /// 리포트 템플릿 ID
    pub template_id: String,
    /// 소스
    pub source: ReportSource,
}

impl NewReport {
    /// 스캔 결과 기반 리포트
    pub fn for_scan(
        template_id: impl Into<String>,
        description: impl Into<String>,
        scan_id: impl Into<String>,
    ) -> Self {
        Self {
            template_id: template_id.into(),
            source: ReportSource {
                description: description.into(),
                list_type: "scan_result".to_owned(),
                id_list: vec![scan_id.into()],
            },
        }
    }
}

/// export 소스
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSource {
    /// 소스 목록 유형 (`scans`)
    pub list_type: String,
    /// 소스 ID 목록
    pub id_list: Vec<String>,
}

/// `POST /exports` 요청 본문
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExport {
    /// export 타입 ID
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub export_id: String,
    /// 소스
    pub source: ExportSource,
}

impl NewExport {
    /// 스캔 목록 export
    pub fn for_scan(export_id: impl Into<String>, scan_id: impl Into<String>) -> Self {
        Self {
            export_id: export_id.into(),
            source: ExportSource {
                list_type: "scans".to_owned(),
                id_list: vec![scan_id.into()],
            },
        }
    }
}

/// 리소스 생성 요청
///
/// 리소스 클라이언트의 `create` 연산이 받는 입력입니다.
#[derive(Debug, Clone, PartialEq)]
pub enum CreateRequest {
    /// 타겟 추가
    Target(AddTargetsRequest),
    /// 스캔 시작
    Scan(NewScan),
    /// 리포트 생성
    Report(NewReport),
    /// export 생성
    Export(NewExport),
}

impl CreateRequest {
    /// 생성되는 리소스 종류
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Target(_) => ResourceKind::Target,
            Self::Scan(_) => ResourceKind::Scan,
            Self::Report(_) => ResourceKind::Report,
            Self::Export(_) => ResourceKind::Export,
        }
    }
}

/// 폴링 시 읽어 온 리소스 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceStatus {
    /// 상태 문자열 (`scheduled`, `processing`, `completed`, ...)
    pub status: String,
    /// 다운로드 링크 (리포트/export만 해당)
    #[serde(default)]
    pub download: Vec<String>,
}

impl ResourceStatus {
    /// 다운로드 링크 없는 상태
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            download: Vec::new(),
        }
    }

    /// 다운로드 링크를 포함한 상태
    pub fn with_download(status: impl Into<String>, download: Vec<String>) -> Self {
        Self {
            status: status.into(),
            download,
        }
    }
}
