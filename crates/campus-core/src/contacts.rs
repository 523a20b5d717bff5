//! 메시지 연락처 목록 상태.
//!
//! 선택, 역할 필터, 검색어, 로딩 플래그, 읽지 않은 메시지 수를 보관하는
//! 단순 상태 컨테이너입니다. 전송/순서 보장은 외부 저장소의 책임입니다.
//!
//! 보는 사람의 역할로 만든 목록([`ContactList::for_viewer`])은 `chat` 기능을 가진
//! 역할끼리만 연락처로 남깁니다. 보는 사람에게 `chat`이 없으면 목록은 비어 있습니다.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::access::RoleDirectory;
use crate::domain::{Feature, Role, RoleClaim};

/// 연락처 항목.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub uid: String,
    pub display_name: String,
    pub role: Role,
    #[serde(default)]
    pub unread: u32,
}

impl Contact {
    pub fn new(uid: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            role,
            unread: 0,
        }
    }

    pub fn with_unread(mut self, unread: u32) -> Self {
        self.unread = unread;
        self
    }
}

/// 연락처 목록 상태.
#[derive(Debug, Clone, Default)]
pub struct ContactList {
    contacts: Vec<Contact>,
    selected: Option<String>,
    role_filter: Option<Role>,
    search: String,
    loading: bool,
    /// 메시지를 보낼 수 있는 역할 (None이면 제한 없음)
    messageable: Option<BTreeSet<Role>>,
}

impl ContactList {
    /// 역할 제한 없는 목록.
    pub fn new() -> Self {
        Self::default()
    }

    /// 보는 사람의 역할 값으로 표준 디렉터리를 적용한 목록.
    pub fn for_viewer(viewer: &RoleClaim) -> Self {
        Self::for_viewer_in(viewer, RoleDirectory::global())
    }

    pub fn for_viewer_in(viewer: &RoleClaim, directory: &RoleDirectory) -> Self {
        let messageable = if directory.allows_claim(viewer, Feature::Chat) {
            directory.roles_with(Feature::Chat).into_iter().collect()
        } else {
            BTreeSet::new()
        };
        Self {
            messageable: Some(messageable),
            ..Self::default()
        }
    }

    /// 메시지를 보낼 수 있는 역할 목록. 제한 없는 목록은 모든 역할입니다.
    pub fn messageable_roles(&self) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|role| self.can_message(*role))
            .collect()
    }

    /// 이 목록에 들어올 수 있는 역할인지 확인.
    pub fn can_message(&self, role: Role) -> bool {
        self.messageable
            .as_ref()
            .map_or(true, |roles| roles.contains(&role))
    }

    /// 로딩 시작.
    pub fn begin_loading(&mut self) {
        self.loading = true;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// 연락처 전체 교체. 메시지를 보낼 수 없는 역할은 제외하고, 선택된 연락처가
    /// 사라지면 선택을 해제합니다.
    pub fn replace(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts
            .into_iter()
            .filter(|c| self.can_message(c.role))
            .collect();
        self.loading = false;
        let stale = self
            .selected
            .as_ref()
            .is_some_and(|uid| !self.contacts.iter().any(|c| &c.uid == uid));
        if stale {
            self.selected = None;
        }
    }

    pub fn set_role_filter(&mut self, role: Option<Role>) {
        self.role_filter = role;
    }

    pub fn role_filter(&self) -> Option<Role> {
        self.role_filter
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
    }

    /// 연락처 선택. 목록에 없는 uid는 무시하고 `false`를 반환합니다.
    ///
    /// 선택하면 해당 연락처의 읽지 않은 수가 0이 됩니다.
    pub fn select(&mut self, uid: &str) -> bool {
        let Some(contact) = self.contacts.iter_mut().find(|c| c.uid == uid) else {
            return false;
        };
        contact.unread = 0;
        self.selected = Some(uid.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Contact> {
        let uid = self.selected.as_ref()?;
        self.contacts.iter().find(|c| &c.uid == uid)
    }

    /// 읽음 처리.
    pub fn mark_read(&mut self, uid: &str) {
        if let Some(contact) = self.contacts.iter_mut().find(|c| c.uid == uid) {
            contact.unread = 0;
        }
    }

    /// 수신 메시지 기록. 현재 선택된 대화는 읽지 않은 수를 늘리지 않습니다.
    pub fn record_incoming(&mut self, uid: &str) -> bool {
        let is_selected = self.selected.as_deref() == Some(uid);
        match self.contacts.iter_mut().find(|c| c.uid == uid) {
            Some(contact) => {
                if !is_selected {
                    contact.unread = contact.unread.saturating_add(1);
                }
                true
            }
            None => false,
        }
    }

    /// 필터와 검색어를 적용한 목록.
    ///
    /// 읽지 않은 수 내림차순, 같으면 이름 순입니다.
    pub fn visible(&self) -> Vec<&Contact> {
        let query = self.search.trim().to_lowercase();
        let mut visible: Vec<&Contact> = self
            .contacts
            .iter()
            .filter(|c| self.role_filter.map_or(true, |role| c.role == role))
            .filter(|c| query.is_empty() || c.display_name.to_lowercase().contains(&query))
            .collect();
        visible.sort_by(|a, b| {
            b.unread
                .cmp(&a.unread)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        visible
    }

    pub fn total_unread(&self) -> u32 {
        self.contacts.iter().map(|c| c.unread).sum()
    }

    /// 역할별 읽지 않은 수 합계.
    pub fn unread_by_role(&self) -> BTreeMap<Role, u32> {
        let mut totals = BTreeMap::new();
        for contact in &self.contacts {
            *totals.entry(contact.role).or_insert(0) += contact.unread;
        }
        totals
    }
}
