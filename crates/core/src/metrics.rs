//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. CLI는 레코더를 설치하지 않으므로 기본적으로 no-op이며,
//! acuctl을 라이브러리로 임베드하는 쪽에서 레코더를 설치하면 수집됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `acuctl_`
//! - 모듈명: `auto_`, `api_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(acuctl_core::metrics::AUTO_STEPS_COMPLETED_TOTAL, "step" => "add_target").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 리소스 종류 레이블 키 (target, scan, report, export)
pub const LABEL_RESOURCE: &str = "resource";

/// 워크플로우 단계 레이블 키
pub const LABEL_STEP: &str = "step";

/// 결과 레이블 키 (success, failure, already_gone)
pub const LABEL_RESULT: &str = "result";

/// HTTP 메서드 레이블 키 (GET, POST, DELETE)
pub const LABEL_METHOD: &str = "method";

// ─── auto 워크플로우 메트릭 ─────────────────────────────────────────

/// auto: 실행된 워크플로우 수 (counter, label: result)
pub const AUTO_RUNS_TOTAL: &str = "acuctl_auto_runs_total";

/// auto: 완료된 단계 수 (counter, label: step)
pub const AUTO_STEPS_COMPLETED_TOTAL: &str = "acuctl_auto_steps_completed_total";

/// auto: 정리 단계의 삭제 시도 수 (counter, labels: resource, result)
pub const AUTO_CLEANUP_DELETES_TOTAL: &str = "acuctl_auto_cleanup_deletes_total";

/// auto: 상태 폴링 요청 수 (counter, label: resource)
pub const AUTO_POLL_ATTEMPTS_TOTAL: &str = "acuctl_auto_poll_attempts_total";

/// auto: 워크플로우 전체 소요 시간 (histogram, 초)
pub const AUTO_RUN_DURATION_SECONDS: &str = "acuctl_auto_run_duration_seconds";

/// auto: 다운로드한 파일 바이트 수 (counter)
pub const AUTO_DOWNLOADED_BYTES_TOTAL: &str = "acuctl_auto_downloaded_bytes_total";

// ─── API 클라이언트 메트릭 ──────────────────────────────────────────

/// api: 전송한 HTTP 요청 수 (counter, label: method)
pub const API_REQUESTS_TOTAL: &str = "acuctl_api_requests_total";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더가 없으면 아무 효과가 없습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(AUTO_RUNS_TOTAL, "Total number of auto workflow runs by result");
    describe_counter!(
        AUTO_STEPS_COMPLETED_TOTAL,
        "Total number of auto workflow steps completed"
    );
    describe_counter!(
        AUTO_CLEANUP_DELETES_TOTAL,
        "Total number of cleanup deletions attempted by resource and result"
    );
    describe_counter!(
        AUTO_POLL_ATTEMPTS_TOTAL,
        "Total number of status reads issued while waiting for a resource"
    );
    describe_histogram!(
        AUTO_RUN_DURATION_SECONDS,
        "Wall-clock duration of an auto workflow run in seconds"
    );
    describe_counter!(
        AUTO_DOWNLOADED_BYTES_TOTAL,
        "Total bytes written to disk by the report downloader"
    );
    describe_counter!(
        API_REQUESTS_TOTAL,
        "Total number of HTTP requests sent to the scanner API"
    );
}
