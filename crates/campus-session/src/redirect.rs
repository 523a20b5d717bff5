//! 리다이렉트 순환 방지.
//!
//! 가드와 대시보드 라우터가 만든 리다이렉트를 페이지가 렌더링될 때까지
//! 하나의 체인으로 기록합니다. 체인 안에서 이미 방문한 경로로 되돌아가거나,
//! 현재 경로로 이동하거나, 홉 수가 한도를 넘으면 체인을 끊고
//! [`UNAUTHORIZED_ROUTE`]로 보냅니다.

use campus_core::navigation::UNAUTHORIZED_ROUTE;
use campus_core::RoleDirectory;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::navigator::Navigator;

/// 한 체인에서 허용하는 최대 리다이렉트 수.
pub const MAX_REDIRECT_HOPS: usize = 4;

/// 리다이렉트 판정.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectDecision {
    /// 요청한 경로로 이동
    Proceed,
    /// 순환 감지, 종단 경로로 이동
    Break { reason: &'static str },
}

/// 렌더링 전까지 이어진 리다이렉트 체인.
#[derive(Debug, Clone, Default)]
pub struct RedirectHistory {
    chain: Vec<String>,
}

impl RedirectHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// `from`에서 `to`로의 리다이렉트를 기록하고 판정합니다.
    pub fn record(&mut self, from: &str, to: &str) -> RedirectDecision {
        // 직전 목적지가 아닌 곳에서 출발하면 새 체인
        if self.chain.last().map(String::as_str) != Some(from) {
            self.chain.clear();
            self.chain.push(from.to_string());
        }

        if to == UNAUTHORIZED_ROUTE {
            self.chain.clear();
            return RedirectDecision::Proceed;
        }

        let reason = if to == from {
            Some("현재 경로로 리다이렉트")
        } else if self.chain.iter().any(|visited| visited == to) {
            Some("이미 방문한 경로로 리다이렉트")
        } else if self.hops() >= MAX_REDIRECT_HOPS {
            Some("리다이렉트 홉 한도 초과")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                tracing::warn!(
                    from,
                    to,
                    chain = ?self.chain,
                    reason,
                    "리다이렉트 순환 감지, 권한 없음 페이지로 이동"
                );
                self.chain.clear();
                RedirectDecision::Break { reason }
            }
            None => {
                self.chain.push(to.to_string());
                RedirectDecision::Proceed
            }
        }
    }

    /// 페이지 렌더링 완료. 체인을 비웁니다.
    pub fn settle(&mut self) {
        self.chain.clear();
    }

    /// 현재 체인의 리다이렉트 수.
    pub fn hops(&self) -> usize {
        self.chain.len().saturating_sub(1)
    }
}

/// 가드와 대시보드 라우터가 공유하는 라우팅 컨텍스트.
///
/// 라우팅 협력자, 리다이렉트 체인, 역할 디렉터리를 묶습니다.
#[derive(Clone)]
pub struct RouterContext {
    navigator: Arc<dyn Navigator>,
    history: Arc<Mutex<RedirectHistory>>,
    directory: Arc<RoleDirectory>,
}

impl RouterContext {
    /// 표준 역할 디렉터리로 생성.
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self::with_directory(navigator, RoleDirectory::global().clone())
    }

    pub fn with_directory(navigator: Arc<dyn Navigator>, directory: RoleDirectory) -> Self {
        let broken = directory.validate_dashboards();
        if !broken.is_empty() {
            tracing::warn!(roles = ?broken, "자기 대시보드에 접근할 수 없는 역할이 있음");
        }
        Self {
            navigator,
            history: Arc::new(Mutex::new(RedirectHistory::new())),
            directory: Arc::new(directory),
        }
    }

    pub fn directory(&self) -> &RoleDirectory {
        &self.directory
    }

    /// 순환 검사를 거쳐 이동하고 실제 목적지를 반환합니다.
    pub fn redirect(&self, from: &str, to: &str) -> String {
        let destination = match self.history().record(from, to) {
            RedirectDecision::Proceed => to,
            RedirectDecision::Break { .. } => UNAUTHORIZED_ROUTE,
        };
        self.navigator.navigate(destination);
        destination.to_string()
    }

    /// 페이지가 렌더링되었음을 알립니다.
    pub fn settle(&self) {
        self.history().settle();
    }

    pub fn hops(&self) -> usize {
        self.history().hops()
    }

    fn history(&self) -> MutexGuard<'_, RedirectHistory> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
