//! 라우팅 협력자.
//!
//! `navigate(path)`는 반환값이 없는 fire-and-forget 호출입니다.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// 화면 전환 요청.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// 채널로 전달하는 라우팅 협력자. 수신 측이 사라졌으면 요청을 버립니다.
impl Navigator for mpsc::UnboundedSender<String> {
    fn navigate(&self, path: &str) {
        if self.send(path.to_string()).is_err() {
            tracing::debug!(path, "라우터 수신 측 종료됨, 이동 요청 무시");
        }
    }
}

/// 이동 요청을 기록만 하는 라우팅 협력자.
///
/// 서버 측 가드 평가와 테스트에서 "몇 번, 어디로 이동했는가"를 확인하는 데 씁니다.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록된 이동 경로 전체.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<String> {
        self.calls().pop()
    }

    pub fn count(&self) -> usize {
        self.calls().len()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_navigator() {
        let nav = RecordingNavigator::new();
        let shared = nav.clone();
        nav.navigate("/login");
        shared.navigate("/dashboard");
        assert_eq!(nav.calls(), vec!["/login", "/dashboard"]);
        assert_eq!(nav.last().as_deref(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn test_channel_navigator() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tx.navigate("/courses");
        assert_eq!(rx.recv().await.as_deref(), Some("/courses"));

        drop(rx);
        tx.navigate("/grades");
    }
}
